// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::future::Future;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;

use crate::constants::CREDENTIAL_REFRESH_BUFFER;
use crate::errors::CredentialError;
use crate::models::CredentialValue;

/// A single cached credential value.
///
/// Lookups take a read lock. A refresh takes the write lock and checks the
/// cache again before resolving, so concurrent callers resolve at most once.
/// Failed refreshes leave the cache untouched.
pub(crate) struct CredentialCache {
    expiry_window: Duration,
    cached: RwLock<Option<CredentialValue>>,
}

impl CredentialCache {
    pub(crate) fn new() -> Self {
        Self {
            expiry_window: CREDENTIAL_REFRESH_BUFFER,
            cached: RwLock::new(None),
        }
    }

    /// Treat cached credentials as expired this long before they actually are.
    pub(crate) fn set_expiry_window(&mut self, expiry_window: Duration) {
        self.expiry_window = expiry_window;
    }

    fn is_valid(&self, cached: &CredentialValue) -> bool {
        !cached.is_expired_at(SystemTime::now(), self.expiry_window)
    }

    /// Returns the cached value, or the one produced by `refresh` if there is
    /// no valid value.
    pub(crate) async fn get_or_refresh<F, Fut>(
        &self,
        refresh: F,
    ) -> Result<CredentialValue, CredentialError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CredentialValue, CredentialError>>,
    {
        // Fast path: check if cached credentials are still valid
        {
            let cache = self.cached.read().await;
            if let Some(ref cached) = *cache
                && self.is_valid(cached)
            {
                return Ok(cached.clone());
            }
        }

        let mut cache = self.cached.write().await;

        // Double-check after acquiring write lock (another task may have refreshed)
        if let Some(ref cached) = *cache
            && self.is_valid(cached)
        {
            return Ok(cached.clone());
        }

        let fresh = refresh().await?;
        *cache = Some(fresh.clone());

        Ok(fresh)
    }

    pub(crate) async fn is_expired(&self) -> bool {
        let cache = self.cached.read().await;
        match *cache {
            Some(ref cached) => !self.is_valid(cached),
            None => true,
        }
    }
}
