// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Building provider chains from a declarative identity document.
//!
//! ```json
//! {
//!   "identities": [
//!     {"kind": "static", "name": "root", "access_key_id": "...", "secret_access_key": "..."},
//!     {"kind": "role", "name": "ops", "role_arn": "arn:aws:iam::123456789012:role/ops",
//!      "session_name": "ops", "source": "root"}
//!   ]
//! }
//! ```
//!
//! Each named identity becomes exactly one provider, shared by every role
//! that names it as its source. A role without a source (or with the source
//! `"default"`) is assumed from the controller principal.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONTROLLER_IDENTITY_NAME, DEFAULT_ROLE_DURATION_SECONDS, MAX_ROLE_DURATION_SECONDS,
    MIN_ROLE_DURATION_SECONDS,
};
use crate::errors::ConfigError;
use crate::identity::{RolePrincipalProvider, SharedPrincipal, StaticPrincipalProvider};
use crate::models::AssumeRoleRequest;
use crate::sts::TrustBroker;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDocument {
    pub identities: Vec<IdentitySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentitySpec {
    Static {
        name: String,
        access_key_id: String,
        secret_access_key: String,
        #[serde(default)]
        session_token: String,
    },
    Role {
        name: String,
        role_arn: String,
        session_name: String,
        #[serde(default = "default_duration_seconds")]
        duration_seconds: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        external_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inline_policy: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
}

fn default_duration_seconds() -> i32 {
    DEFAULT_ROLE_DURATION_SECONDS
}

impl IdentitySpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Static { name, .. } | Self::Role { name, .. } => name,
        }
    }
}

impl IdentityDocument {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_json(&bytes)
    }
}

/// Named providers built from an [`IdentityDocument`].
pub struct PrincipalRegistry {
    principals: BTreeMap<String, SharedPrincipal>,
    by_hash: Mutex<HashMap<String, SharedPrincipal>>,
}

impl PrincipalRegistry {
    /// Builds every identity of the document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for duplicate names, unknown sources, cycles
    /// and out-of-range durations. Nothing is called remotely.
    pub fn build(
        document: &IdentityDocument,
        controller: SharedPrincipal,
        broker: Arc<dyn TrustBroker>,
    ) -> Result<Self, ConfigError> {
        let mut specs: BTreeMap<&str, &IdentitySpec> = BTreeMap::new();
        for spec in &document.identities {
            let name = spec.name();
            if name == CONTROLLER_IDENTITY_NAME || specs.insert(name, spec).is_some() {
                return Err(ConfigError::DuplicateIdentity(name.to_string()));
            }
            if let IdentitySpec::Role {
                duration_seconds, ..
            } = spec
                && !(MIN_ROLE_DURATION_SECONDS..=MAX_ROLE_DURATION_SECONDS)
                    .contains(duration_seconds)
            {
                return Err(ConfigError::InvalidDuration {
                    identity: name.to_string(),
                    duration: *duration_seconds,
                });
            }
        }

        let mut builder = Builder {
            specs: &specs,
            controller: &controller,
            broker: &broker,
            built: BTreeMap::new(),
            path: Vec::new(),
        };
        for name in specs.keys() {
            builder.resolve(name)?;
        }

        let mut principals = builder.built;
        principals.insert(CONTROLLER_IDENTITY_NAME.to_string(), controller);

        let by_hash = principals
            .values()
            .map(|principal| (principal.hash(), principal.clone()))
            .collect();

        tracing::debug!("[credvault] built {} identities", principals.len());

        Ok(Self {
            principals,
            by_hash: Mutex::new(by_hash),
        })
    }

    pub fn get(&self, name: &str) -> Result<SharedPrincipal, ConfigError> {
        self.principals
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.principals.keys().map(String::as_str)
    }

    /// Returns the registered provider with the same identity as `principal`,
    /// registering `principal` if there is none yet, so cached credentials
    /// survive across callers that rebuild equivalent providers.
    pub fn dedup(&self, principal: SharedPrincipal) -> SharedPrincipal {
        let mut by_hash = self.by_hash.lock().unwrap_or_else(PoisonError::into_inner);
        by_hash
            .entry(principal.hash())
            .or_insert(principal)
            .clone()
    }
}

struct Builder<'a> {
    specs: &'a BTreeMap<&'a str, &'a IdentitySpec>,
    controller: &'a SharedPrincipal,
    broker: &'a Arc<dyn TrustBroker>,
    built: BTreeMap<String, SharedPrincipal>,
    path: Vec<String>,
}

impl Builder<'_> {
    fn resolve(&mut self, name: &str) -> Result<SharedPrincipal, ConfigError> {
        let specs = self.specs;
        if let Some(principal) = self.built.get(name) {
            return Ok(principal.clone());
        }
        if let Some(start) = self.path.iter().position(|visiting| visiting == name) {
            let mut cycle = self.path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(ConfigError::Cycle(cycle));
        }
        let spec = *specs
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;

        self.path.push(name.to_string());
        let principal: SharedPrincipal = match spec {
            IdentitySpec::Static {
                name,
                access_key_id,
                secret_access_key,
                session_token,
            } => Arc::new(StaticPrincipalProvider::new(
                name.as_str(),
                access_key_id.as_str(),
                secret_access_key.as_str(),
                session_token.as_str(),
            )),
            IdentitySpec::Role {
                name,
                role_arn,
                session_name,
                duration_seconds,
                external_id,
                inline_policy,
                source,
            } => {
                let source = match source.as_deref() {
                    None | Some(CONTROLLER_IDENTITY_NAME) => self.controller.clone(),
                    Some(source_name) if specs.contains_key(source_name) => {
                        self.resolve(source_name)?
                    }
                    Some(source_name) => {
                        return Err(ConfigError::UnknownSource {
                            identity: name.clone(),
                            source_name: source_name.to_string(),
                        });
                    }
                };

                let mut request = AssumeRoleRequest::new(
                    role_arn.as_str(),
                    session_name.as_str(),
                    *duration_seconds,
                );
                if let Some(external_id) = external_id {
                    request = request.with_external_id(external_id.as_str());
                }
                if let Some(inline_policy) = inline_policy {
                    request = request.with_policy(inline_policy.as_str());
                }

                Arc::new(RolePrincipalProvider::new(
                    name.as_str(),
                    request,
                    source,
                    self.broker.clone(),
                ))
            }
        };
        self.path.pop();

        self.built.insert(name.to_string(), principal.clone());
        Ok(principal)
    }
}
