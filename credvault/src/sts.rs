// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Role assumption through the AWS Security Token Service (STS).

use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::SdkConfig;

use crate::constants::ASSUME_ROLE_PROVIDER_NAME;
use crate::errors::{CredentialError, ErrorKind, classify_sdk_error};
use crate::models::{AssumeRoleRequest, CredentialValue};

/// Exchanges a source principal's credentials for a role's credentials.
///
/// Implementations must not retry on their own; authorization failures are
/// returned to the caller as they are.
#[async_trait]
pub trait TrustBroker: Send + Sync {
    async fn assume_role(
        &self,
        source: &CredentialValue,
        request: &AssumeRoleRequest,
    ) -> Result<CredentialValue, CredentialError>;
}

/// [`TrustBroker`] backed by `sts:AssumeRole`.
///
/// Every call builds a client from the shared SDK configuration with the
/// source credentials injected, so one broker serves every hop of a chain.
#[derive(Debug, Clone)]
pub struct StsTrustBroker {
    config: SdkConfig,
}

impl StsTrustBroker {
    pub fn new(config: SdkConfig) -> Self {
        Self { config }
    }

    fn client_for(&self, source: &CredentialValue) -> aws_sdk_sts::Client {
        let config = aws_sdk_sts::config::Builder::from(&self.config)
            .credentials_provider(source.to_sdk_credentials())
            .build();
        aws_sdk_sts::Client::from_conf(config)
    }
}

#[async_trait]
impl TrustBroker for StsTrustBroker {
    #[tracing::instrument(skip(self, source, request), fields(role_arn = %request.role_arn))]
    async fn assume_role(
        &self,
        source: &CredentialValue,
        request: &AssumeRoleRequest,
    ) -> Result<CredentialValue, CredentialError> {
        let output = self
            .client_for(source)
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .duration_seconds(request.duration_seconds)
            .set_external_id(request.external_id.clone())
            .set_policy(request.policy.clone())
            .send()
            .await
            .map_err(|err| CredentialError::AssumeRole {
                role_arn: request.role_arn.clone(),
                // the chain never retries, so every failure is final
                source: classify_sdk_error(&err, |_| ErrorKind::Fatal),
            })?;

        let credentials = output
            .credentials()
            .ok_or_else(|| CredentialError::MissingCredentials(request.role_arn.clone()))?;

        let expiration = SystemTime::try_from(*credentials.expiration())
            .map_err(|err| CredentialError::InvalidExpiration(err.to_string()))?;

        Ok(CredentialValue::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.session_token(),
            ASSUME_ROLE_PROVIDER_NAME,
            Some(expiration),
        ))
    }
}
