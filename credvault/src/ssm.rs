// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Parameter store transport.
//!
//! [`ParameterStore`] is the seam the secret store is written against; every
//! failure crossing it is already a [`RemoteError`] with a closed
//! [`ErrorKind`](crate::errors::ErrorKind). Any store of small named values
//! fits behind it, see [`SecretsManagerStore`](crate::secretsmanager::SecretsManagerStore).

use async_trait::async_trait;
use aws_sdk_ssm::types::{ParameterType, Tag};

use crate::errors::{ErrorKind, RemoteError, classify_parameter_store_code, classify_sdk_error};
use crate::models::{ParameterRecord, StoreLayout};

#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Naming and capacity of the store's items.
    fn layout(&self) -> StoreLayout {
        StoreLayout::PARAMETER_STORE
    }

    /// Creates a parameter; never overwrites an existing one.
    async fn put_parameter(&self, record: &ParameterRecord) -> Result<(), RemoteError>;

    async fn delete_parameter(&self, name: &str) -> Result<(), RemoteError>;

    /// Returns the decrypted value, `None` if the parameter carries none.
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, RemoteError>;
}

/// [`ParameterStore`] backed by AWS Systems Manager Parameter Store.
///
/// Values are written as `SecureString` parameters.
#[derive(Debug, Clone)]
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    #[tracing::instrument(skip(self, record), fields(name = %record.name))]
    async fn put_parameter(&self, record: &ParameterRecord) -> Result<(), RemoteError> {
        let tags = record
            .tags
            .iter()
            .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| RemoteError::new(ErrorKind::Fatal, "InvalidTag", err.to_string()))?;

        self.client
            .put_parameter()
            .name(&record.name)
            .value(&record.value)
            .r#type(ParameterType::SecureString)
            .overwrite(false)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err, classify_parameter_store_code))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_parameter(&self, name: &str) -> Result<(), RemoteError> {
        self.client
            .delete_parameter()
            .name(name)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err, classify_parameter_store_code))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, RemoteError> {
        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err, classify_parameter_store_code))?;

        Ok(output
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(str::to_string))
    }
}
