// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sdk_sts::error::DisplayErrorContext;

use crate::constants::{CONTROLLER_IDENTITY_NAME, CONTROLLER_PROVIDER_NAME};
use crate::errors::CredentialError;
use crate::identity::cache::CredentialCache;
use crate::identity::{IdentityDigest, Principal};
use crate::models::CredentialValue;

/// The process's own identity, as resolved by the AWS default credential
/// chain (environment, profile, web identity, IMDS).
///
/// Role identities without an explicit source are assumed from here.
pub struct ControllerPrincipalProvider {
    provider: SharedCredentialsProvider,
    cache: CredentialCache,
}

impl ControllerPrincipalProvider {
    pub fn new(provider: impl ProvideCredentials + 'static) -> Self {
        Self {
            provider: SharedCredentialsProvider::new(provider),
            cache: CredentialCache::new(),
        }
    }

    /// Uses the credentials provider of a loaded SDK configuration, if it has one.
    pub fn from_sdk_config(config: &SdkConfig) -> Option<Self> {
        config.credentials_provider().map(|provider| Self {
            provider,
            cache: CredentialCache::new(),
        })
    }

    pub fn with_expiry_window(mut self, expiry_window: Duration) -> Self {
        self.cache.set_expiry_window(expiry_window);
        self
    }

    async fn resolve(&self) -> Result<CredentialValue, CredentialError> {
        let credentials = self.provider.provide_credentials().await.map_err(|err| {
            CredentialError::Provider {
                name: CONTROLLER_IDENTITY_NAME.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            }
        })?;
        let credential = CredentialValue::from_sdk(&credentials, CONTROLLER_PROVIDER_NAME);

        tracing::debug!(
            "[credvault] refreshed controller credentials, expires_at: {:?}",
            credential.expiration
        );

        Ok(credential)
    }
}

#[async_trait]
impl Principal for ControllerPrincipalProvider {
    async fn retrieve(&self) -> Result<CredentialValue, CredentialError> {
        self.cache.get_or_refresh(|| self.resolve()).await
    }

    async fn is_expired(&self) -> bool {
        self.cache.is_expired().await
    }

    fn name(&self) -> &str {
        CONTROLLER_IDENTITY_NAME
    }

    fn hash(&self) -> String {
        let mut digest = IdentityDigest::new("controller");
        digest.field(CONTROLLER_IDENTITY_NAME);
        digest.finish()
    }
}
