// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Role assumption on top of another principal.
//!
//! The assumed credentials are cached until they expire, behind a
//! [`CredentialCache`] so concurrent callers of one provider never assume the
//! same role twice.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::constants::ASSUME_ROLE_PROVIDER_NAME;
use crate::errors::CredentialError;
use crate::identity::cache::CredentialCache;
use crate::identity::{IdentityDigest, Principal, SharedPrincipal};
use crate::models::{AssumeRoleRequest, CredentialValue};
use crate::sts::TrustBroker;

pub struct RolePrincipalProvider {
    name: String,
    request: AssumeRoleRequest,
    source: SharedPrincipal,
    broker: Arc<dyn TrustBroker>,
    cache: CredentialCache,
}

impl RolePrincipalProvider {
    pub fn new(
        name: impl Into<String>,
        request: AssumeRoleRequest,
        source: SharedPrincipal,
        broker: Arc<dyn TrustBroker>,
    ) -> Self {
        Self {
            name: name.into(),
            request,
            source,
            broker,
            cache: CredentialCache::new(),
        }
    }

    /// Treat cached credentials as expired this long before they actually are.
    pub fn with_expiry_window(mut self, expiry_window: Duration) -> Self {
        self.cache.set_expiry_window(expiry_window);
        self
    }

    pub fn request(&self) -> &AssumeRoleRequest {
        &self.request
    }

    pub fn source(&self) -> &SharedPrincipal {
        &self.source
    }

    #[tracing::instrument(skip(self), fields(name = %self.name, role_arn = %self.request.role_arn))]
    async fn assume(&self) -> Result<CredentialValue, CredentialError> {
        let source = self.source.retrieve().await?;
        let mut assumed = self.broker.assume_role(&source, &self.request).await?;
        assumed.provider_name = ASSUME_ROLE_PROVIDER_NAME.to_string();

        tracing::debug!(
            "[credvault] assumed role {}, expires_at: {:?}",
            self.request.role_arn,
            assumed.expiration
        );

        Ok(assumed)
    }
}

#[async_trait]
impl Principal for RolePrincipalProvider {
    async fn retrieve(&self) -> Result<CredentialValue, CredentialError> {
        self.cache.get_or_refresh(|| self.assume()).await
    }

    async fn is_expired(&self) -> bool {
        self.cache.is_expired().await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hash(&self) -> String {
        let mut digest = IdentityDigest::new("role");
        digest
            .field(&self.request.role_arn)
            .field(&self.request.session_name)
            .optional(self.request.external_id.as_deref())
            .optional(self.request.policy.as_deref())
            .field(&self.source.hash());
        digest.finish()
    }
}
