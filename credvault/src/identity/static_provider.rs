// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;

use crate::constants::STATIC_PROVIDER_NAME;
use crate::errors::CredentialError;
use crate::identity::{IdentityDigest, Principal};
use crate::models::CredentialValue;

/// A long-lived access key pair. Never expires.
pub struct StaticPrincipalProvider {
    name: String,
    credential: CredentialValue,
}

impl StaticPrincipalProvider {
    pub fn new(
        name: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            credential: CredentialValue::new(
                access_key_id,
                secret_access_key,
                session_token,
                STATIC_PROVIDER_NAME,
                None,
            ),
        }
    }
}

#[async_trait]
impl Principal for StaticPrincipalProvider {
    async fn retrieve(&self) -> Result<CredentialValue, CredentialError> {
        Ok(self.credential.clone())
    }

    async fn is_expired(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hash(&self) -> String {
        let mut digest = IdentityDigest::new("static");
        digest
            .field(&self.name)
            .field(&self.credential.access_key_id)
            .field(&self.credential.secret_access_key)
            .field(&self.credential.session_token);
        digest.finish()
    }
}
