// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Secrets Manager as a chunk store.
//!
//! Each chunk becomes one secret named `<prefix>-<index>`. Secrets hold more
//! than a standard parameter, so a payload needs fewer of them, at a higher
//! price per item.

use async_trait::async_trait;
use aws_sdk_secretsmanager::types::Tag;

use crate::errors::{RemoteError, classify_sdk_error, classify_secrets_manager_code};
use crate::models::{ParameterRecord, StoreLayout};
use crate::ssm::ParameterStore;

#[derive(Debug, Clone)]
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SecretsManagerStore {
    fn layout(&self) -> StoreLayout {
        StoreLayout::SECRETS_MANAGER
    }

    #[tracing::instrument(skip(self, record), fields(name = %record.name))]
    async fn put_parameter(&self, record: &ParameterRecord) -> Result<(), RemoteError> {
        let tags = record
            .tags
            .iter()
            .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
            .collect();

        self.client
            .create_secret()
            .name(&record.name)
            .secret_string(&record.value)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err, classify_secrets_manager_code))?;

        Ok(())
    }

    /// Deletes immediately; a chunk set is never restored piecewise.
    #[tracing::instrument(skip(self))]
    async fn delete_parameter(&self, name: &str) -> Result<(), RemoteError> {
        self.client
            .delete_secret()
            .secret_id(name)
            .force_delete_without_recovery(true)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err, classify_secrets_manager_code))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, RemoteError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err, classify_secrets_manager_code))?;

        Ok(output.secret_string().map(str::to_string))
    }
}
