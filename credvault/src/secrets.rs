// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Secrets larger than a single parameter.
//!
//! A payload is base64 encoded, split into chunks of at most the store's
//! per-item capacity, and each chunk `i` is written to `<prefix>/<i>` in the
//! parameter store or `<prefix>-<i>` in Secrets Manager.
//! The caller keeps the returned [`SecretAddress`] to read or delete the set
//! later.
//!
//! # Errors
//!
//! | Kind | `create` | `delete` |
//! |------|----------|----------|
//! | Transient | retried with backoff | reported |
//! | Conflict | fails immediately | reported |
//! | NotFound | fails | ignored |
//! | Fatal | fails | reported |

use std::time::Duration;

use futures::future::join_all;
use uuid::Uuid;

use crate::chunker::{join, split_chunks};
use crate::constants::{
    DEFAULT_PREFIX_ROOT, RETRY_INITIAL_BACKOFF, RETRY_MAX_ATTEMPTS, RETRY_MAX_BACKOFF,
};
use crate::errors::{DeleteError, ErrorKind, RemoteError, SecretError};
use crate::models::{Chunk, ParameterRecord, SecretAddress, SecretOwner, StoreLayout};
use crate::ssm::ParameterStore;

/// Bounded exponential backoff for transient write failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per chunk, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_backoff: RETRY_INITIAL_BACKOFF,
            max_backoff: RETRY_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the delay after the given failed attempt (1-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Full jitter between half the ceiling and the ceiling.
    fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        let half = ceiling / 2;
        let jitter = fastrand::u64(0..=(ceiling - half).as_millis() as u64);
        half + Duration::from_millis(jitter)
    }
}

/// Applies the store's naming rule to a caller-supplied prefix.
///
/// Parameter store names must be absolute, so a missing leading separator is
/// added there; everything else is kept as given. An empty prefix is replaced
/// with a fresh unique one under [`DEFAULT_PREFIX_ROOT`].
pub fn normalize_prefix(prefix: &str, layout: &StoreLayout) -> String {
    if prefix.is_empty() {
        let generated = format!("{DEFAULT_PREFIX_ROOT}{}{}", layout.separator, Uuid::new_v4());
        return layout.qualify(&generated);
    }
    layout.qualify(prefix)
}

pub struct SecretStore<S> {
    store: S,
    max_chunk_size: Option<usize>,
    retry: RetryPolicy,
}

impl<S: ParameterStore> SecretStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_chunk_size: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the store's per-item capacity, e.g. for advanced tier parameters.
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = Some(max_chunk_size);
        self
    }

    fn max_chunk_size(&self) -> usize {
        self.max_chunk_size.unwrap_or(self.store.layout().max_item_size)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Address of a chunk set written earlier, from a prefix as a caller
    /// would type it. No prefix is generated here.
    pub fn address(&self, prefix: &str, chunk_count: usize) -> SecretAddress {
        SecretAddress::new(self.store.layout().qualify(prefix), chunk_count)
    }

    /// Writes `data` as a chunk set under `prefix`, named by the store's
    /// [`StoreLayout`].
    ///
    /// Chunks are written in index order. A failed write stops the call and
    /// leaves earlier chunks in place; the error reports how many were written.
    ///
    /// # Errors
    ///
    /// - [`SecretError::Chunk`] if the configured chunk size is zero
    /// - [`SecretError::Write`] if a chunk could not be written
    #[tracing::instrument(skip(self, data, owner), fields(bytes = data.len()))]
    pub async fn create(
        &self,
        prefix: &str,
        data: &[u8],
        owner: &SecretOwner,
    ) -> Result<SecretAddress, SecretError> {
        let layout = self.store.layout();
        let prefix = normalize_prefix(prefix, &layout);
        let chunks = split_chunks(data, true, self.max_chunk_size())?;
        if chunks.is_empty() {
            return Ok(SecretAddress::new(prefix, 0));
        }

        let tags = owner.tags();
        for Chunk { index, bytes } in chunks.iter() {
            let record = ParameterRecord {
                name: layout.item_name(&prefix, *index),
                // base64 output is always ASCII
                value: String::from_utf8_lossy(bytes).into_owned(),
                tags: tags.clone(),
            };

            self.put_with_retry(&record)
                .await
                .map_err(|(attempts, source)| SecretError::Write {
                    prefix: prefix.clone(),
                    index: *index,
                    attempts,
                    written: *index,
                    source,
                })?;
        }

        tracing::debug!(
            "[credvault] wrote {} chunk(s) under {}",
            chunks.len(),
            prefix
        );

        Ok(SecretAddress::new(prefix, chunks.len()))
    }

    async fn put_with_retry(&self, record: &ParameterRecord) -> Result<(), (u32, RemoteError)> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.put_parameter(record).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        "[credvault] retrying {} in {:?} after attempt {}: {}",
                        record.name,
                        delay,
                        attempt,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err((attempt, err)),
            }
        }
    }

    /// Deletes every chunk of a set. Chunks that are already gone are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Delete`] listing every other failure in index order.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, address: &SecretAddress) -> Result<(), SecretError> {
        if address.chunk_count == 0 {
            return Ok(());
        }

        let layout = self.store.layout();
        let results = join_all((0..address.chunk_count).map(|index| {
            let name = layout.item_name(&address.prefix, index);
            async move { self.store.delete_parameter(&name).await }
        }))
        .await;

        let errors: Vec<RemoteError> = results
            .into_iter()
            .filter_map(Result::err)
            .filter(|err| err.kind != ErrorKind::NotFound)
            .collect();

        if !errors.is_empty() {
            return Err(DeleteError { errors }.into());
        }

        tracing::debug!(
            "[credvault] deleted {} chunk(s) under {}",
            address.chunk_count,
            address.prefix
        );

        Ok(())
    }

    /// Reads a chunk set back and reassembles the original payload.
    ///
    /// # Errors
    ///
    /// - [`SecretError::Read`] if a chunk could not be fetched
    /// - [`SecretError::MissingValue`] if a chunk has no value
    /// - [`SecretError::Chunk`] if the chunks do not decode
    #[tracing::instrument(skip(self))]
    pub async fn read(&self, address: &SecretAddress) -> Result<Vec<u8>, SecretError> {
        let layout = self.store.layout();
        let mut chunks = Vec::with_capacity(address.chunk_count);
        for index in 0..address.chunk_count {
            let name = layout.item_name(&address.prefix, index);
            let value = self
                .store
                .get_parameter(&name)
                .await
                .map_err(|source| SecretError::Read {
                    name: name.clone(),
                    source,
                })?
                .ok_or_else(|| SecretError::MissingValue(name.clone()))?;

            chunks.push(Chunk {
                index,
                bytes: value.into_bytes(),
            });
        }

        Ok(join(&chunks, true)?)
    }
}
