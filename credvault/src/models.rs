// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime};

use aws_credential_types::Credentials;
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use crate::constants::{
    CLUSTER_TAG_PREFIX, MAX_PARAMETER_SIZE, MAX_SECRET_SIZE, NAME_TAG_KEY, OWNED_TAG_VALUE,
    PATH_SEPARATOR, ROLE_TAG_KEY, SECRET_NAME_SEPARATOR,
};

/// A resolved set of credentials.
///
/// Values are immutable once returned by a provider; a later `retrieve` may
/// produce a different value.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct CredentialValue {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[zeroize(skip)]
    pub provider_name: String,
    /// `None` for long-lived credentials.
    #[zeroize(skip)]
    pub expiration: Option<SystemTime>,
}

impl CredentialValue {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        provider_name: impl Into<String>,
        expiration: Option<SystemTime>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            provider_name: provider_name.into(),
            expiration,
        }
    }

    /// Whether the value is unusable at `now` once `window` is reserved
    /// before its expiration.
    pub fn is_expired_at(&self, now: SystemTime, window: Duration) -> bool {
        match self.expiration {
            Some(expiration) => now
                .checked_add(window)
                .map(|threshold| threshold >= expiration)
                .unwrap_or(true),
            None => false,
        }
    }

    /// Converts the value into SDK credentials for signing requests.
    pub fn to_sdk_credentials(&self) -> Credentials {
        let session_token = if self.session_token.is_empty() {
            None
        } else {
            Some(self.session_token.clone())
        };

        Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            session_token,
            self.expiration,
            "credvault",
        )
    }
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for CredentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialValue")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("provider_name", &self.provider_name)
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl CredentialValue {
    pub(crate) fn from_sdk(credentials: &Credentials, provider_name: &str) -> Self {
        let token = match credentials.session_token() {
            Some(token) => token.to_string(),
            None => "".to_string(),
        };

        Self {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: token,
            provider_name: provider_name.to_string(),
            expiration: credentials.expiry(),
        }
    }
}

/// An `AssumeRole` call against the trust broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub duration_seconds: i32,
    pub external_id: Option<String>,
    pub policy: Option<String>,
}

impl AssumeRoleRequest {
    pub fn new(
        role_arn: impl Into<String>,
        session_name: impl Into<String>,
        duration_seconds: i32,
    ) -> Self {
        Self {
            role_arn: role_arn.into(),
            session_name: session_name.into(),
            duration_seconds,
            external_id: None,
            policy: None,
        }
    }

    /// Empty values are not sent.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into()).filter(|id| !id.is_empty());
        self
    }

    /// Empty values are not sent.
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into()).filter(|p| !p.is_empty());
        self
    }
}

/// One bounded slice of a larger payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// A single named parameter as written to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRecord {
    pub name: String,
    pub value: String,
    /// Ordered by key.
    pub tags: Vec<Tag>,
}

/// Where a chunk set lives. Callers persist this between `create` and a
/// later `read` or `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretAddress {
    pub prefix: String,
    pub chunk_count: usize,
}

impl SecretAddress {
    pub fn new(prefix: impl Into<String>, chunk_count: usize) -> Self {
        Self {
            prefix: prefix.into(),
            chunk_count,
        }
    }
}

/// How a store names the items of a chunk set, and how large one item may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLayout {
    /// Joins the prefix and the chunk index.
    pub separator: char,
    /// Whether names must start with [`PATH_SEPARATOR`].
    pub absolute: bool,
    pub max_item_size: usize,
}

impl StoreLayout {
    /// `/<prefix>/<index>`, 4 KB per parameter.
    pub const PARAMETER_STORE: Self = Self {
        separator: PATH_SEPARATOR,
        absolute: true,
        max_item_size: MAX_PARAMETER_SIZE,
    };

    /// `<prefix>-<index>`, names taken as given.
    pub const SECRETS_MANAGER: Self = Self {
        separator: SECRET_NAME_SEPARATOR,
        absolute: false,
        max_item_size: MAX_SECRET_SIZE,
    };

    /// Adds a missing leading [`PATH_SEPARATOR`] when names must be absolute.
    /// Anything else passes through unchanged.
    pub fn qualify(&self, prefix: &str) -> String {
        if self.absolute && !prefix.starts_with(PATH_SEPARATOR) {
            format!("{PATH_SEPARATOR}{prefix}")
        } else {
            prefix.to_string()
        }
    }

    pub fn item_name(&self, prefix: &str, index: usize) -> String {
        format!("{prefix}{}{index}", self.separator)
    }
}

/// Ownership of a secret, rendered into the tag set of each of its parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretOwner {
    pub name: String,
    pub cluster: String,
    pub role: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl SecretOwner {
    pub fn new(
        name: impl Into<String>,
        cluster: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cluster: cluster.into(),
            role: role.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Ownership tags sorted by key. Extra tags never override the ownership ones.
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags = self.extra.clone();
        tags.insert(NAME_TAG_KEY.to_string(), self.name.clone());
        tags.insert(
            format!("{CLUSTER_TAG_PREFIX}{}", self.cluster),
            OWNED_TAG_VALUE.to_string(),
        );
        tags.insert(ROLE_TAG_KEY.to_string(), self.role.clone());

        tags.into_iter()
            .map(|(key, value)| Tag { key, value })
            .collect()
    }
}
