// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Credential providers composable into chains of delegated trust.
//!
//! A chain is rooted at a [`StaticPrincipalProvider`] (or the process's own
//! [`ControllerPrincipalProvider`]) and extended by any number of
//! [`RolePrincipalProvider`] hops, each holding a shared reference to its
//! source. Sources are never owned by the roles that use them, so one source
//! can back several roles.
//!
//! ```text
//! StaticPrincipal --AssumeRole--> RolePrincipal --AssumeRole--> RolePrincipal
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use aws_credential_types::provider::{self, ProvideCredentials, error::CredentialsError};
use aws_lc_rs::digest::{self, SHA256};
use data_encoding::HEXLOWER;

use crate::errors::CredentialError;
use crate::models::CredentialValue;

mod cache;
pub mod controller_provider;
pub mod registry;
pub mod role_provider;
pub mod static_provider;

pub use controller_provider::ControllerPrincipalProvider;
pub use registry::{IdentityDocument, IdentitySpec, PrincipalRegistry};
pub use role_provider::RolePrincipalProvider;
pub use static_provider::StaticPrincipalProvider;

/// An entity capable of producing a [`CredentialValue`].
#[async_trait]
pub trait Principal: Send + Sync {
    /// Returns usable credentials, resolving them if needed.
    async fn retrieve(&self) -> Result<CredentialValue, CredentialError>;

    /// Whether the next [`retrieve`](Principal::retrieve) has to resolve
    /// fresh credentials.
    async fn is_expired(&self) -> bool;

    fn name(&self) -> &str;

    /// Deterministic digest of the fields that define this principal's
    /// identity, stable across processes.
    fn hash(&self) -> String;
}

pub type SharedPrincipal = Arc<dyn Principal>;

/// Length-prefixed SHA-256 over identity fields.
pub(crate) struct IdentityDigest(digest::Context);

impl IdentityDigest {
    pub(crate) fn new(kind: &str) -> Self {
        let mut digest = Self(digest::Context::new(&SHA256));
        digest.field(kind);
        digest
    }

    pub(crate) fn field(&mut self, value: &str) -> &mut Self {
        self.0.update(&(value.len() as u64).to_be_bytes());
        self.0.update(value.as_bytes());
        self
    }

    pub(crate) fn optional(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => {
                self.0.update(&[1]);
                self.field(value)
            }
            None => {
                self.0.update(&[0]);
                self
            }
        }
    }

    pub(crate) fn finish(self) -> String {
        HEXLOWER.encode(self.0.finish().as_ref())
    }
}

/// Adapts a [`Principal`] into an SDK credentials provider, so SDK clients
/// sign their requests with whatever the chain resolves.
#[derive(Clone)]
pub struct PrincipalCredentialsProvider {
    principal: SharedPrincipal,
}

impl PrincipalCredentialsProvider {
    pub fn new(principal: SharedPrincipal) -> Self {
        Self { principal }
    }
}

impl std::fmt::Debug for PrincipalCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalCredentialsProvider")
            .field("principal", &self.principal.name())
            .finish()
    }
}

impl ProvideCredentials for PrincipalCredentialsProvider {
    fn provide_credentials<'a>(&'a self) -> provider::future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        provider::future::ProvideCredentials::new(async move {
            let value = self
                .principal
                .retrieve()
                .await
                .map_err(CredentialsError::provider_error)?;
            Ok(value.to_sdk_credentials())
        })
    }
}
