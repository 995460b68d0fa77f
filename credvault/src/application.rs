// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow, bail};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::primitives::{DateTime, DateTimeFormat};
use serde_json::json;
use tokio::io::AsyncWriteExt;

use crate::configuration::{Command, SecretBackend, SecretCommand, VaultOptions};
use crate::identity::{
    ControllerPrincipalProvider, IdentityDocument, PrincipalCredentialsProvider, PrincipalRegistry,
    SharedPrincipal,
};
use crate::models::{CredentialValue, SecretOwner};
use crate::secrets::SecretStore;
use crate::secretsmanager::SecretsManagerStore;
use crate::ssm::{ParameterStore, SsmParameterStore};
use crate::sts::StsTrustBroker;

pub struct Application {
    options: VaultOptions,
    sdk_config: SdkConfig,
    principal: SharedPrincipal,
}

impl Application {
    /// Loads the SDK configuration and resolves the selected identity's
    /// provider chain. No credentials are fetched yet.
    pub async fn build(options: VaultOptions) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = options.region.clone() {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        let controller: SharedPrincipal = Arc::new(
            ControllerPrincipalProvider::from_sdk_config(&sdk_config)
                .ok_or_else(|| anyhow!("no default credentials provider configured"))?,
        );

        let principal = match (&options.identities, &options.identity) {
            (Some(path), identity) => {
                let document = IdentityDocument::load(path)
                    .await
                    .with_context(|| format!("loading identities from {}", path.display()))?;
                let broker = Arc::new(StsTrustBroker::new(sdk_config.clone()));
                let registry = PrincipalRegistry::build(&document, controller, broker)?;

                tracing::debug!(
                    "[credvault] identities: {:?}",
                    registry.names().collect::<Vec<_>>()
                );

                match identity {
                    Some(name) => registry.get(name)?,
                    None => registry.get(crate::constants::CONTROLLER_IDENTITY_NAME)?,
                }
            }
            (None, Some(name)) => bail!("identity {name} requested without an identity document"),
            (None, None) => controller,
        };

        tracing::info!("[credvault] acting as identity {}", principal.name());

        Ok(Self {
            options,
            sdk_config,
            principal,
        })
    }

    pub async fn run(self) -> Result<()> {
        match &self.options.command {
            Command::Credentials { show_secrets } => self.credentials(*show_secrets).await,
            Command::Secret(command) => self.secret(command).await,
        }
    }

    async fn credentials(&self, show_secrets: bool) -> Result<()> {
        let value = self.principal.retrieve().await?;
        println!("{}", render_credentials(&value, show_secrets));
        Ok(())
    }

    fn ssm_store(&self) -> SecretStore<SsmParameterStore> {
        let config = aws_sdk_ssm::config::Builder::from(&self.sdk_config)
            .credentials_provider(PrincipalCredentialsProvider::new(self.principal.clone()))
            .build();
        self.secret_store(SsmParameterStore::new(aws_sdk_ssm::Client::from_conf(config)))
    }

    fn secrets_manager_store(&self) -> SecretStore<SecretsManagerStore> {
        let config = aws_sdk_secretsmanager::config::Builder::from(&self.sdk_config)
            .credentials_provider(PrincipalCredentialsProvider::new(self.principal.clone()))
            .build();
        let client = aws_sdk_secretsmanager::Client::from_conf(config);
        self.secret_store(SecretsManagerStore::new(client))
    }

    fn secret_store<S: ParameterStore>(&self, store: S) -> SecretStore<S> {
        match self.options.max_chunk_size {
            Some(max_chunk_size) => SecretStore::new(store).with_max_chunk_size(max_chunk_size),
            None => SecretStore::new(store),
        }
    }

    async fn secret(&self, command: &SecretCommand) -> Result<()> {
        match self.options.backend {
            SecretBackend::SsmParameterStore => run_secret(&self.ssm_store(), command).await,
            SecretBackend::SecretsManager => {
                run_secret(&self.secrets_manager_store(), command).await
            }
        }
    }
}

async fn run_secret<S: ParameterStore>(
    store: &SecretStore<S>,
    command: &SecretCommand,
) -> Result<()> {
    match command {
        SecretCommand::Put {
            prefix,
            file,
            name,
            cluster,
            role,
            tags,
        } => {
            let data = tokio::fs::read(file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let owner = tags
                .iter()
                .fold(SecretOwner::new(name, cluster, role), |owner, (key, value)| {
                    owner.with_tag(key, value)
                });
            let address = store.create(prefix, &data, &owner).await?;
            println!("{}", serde_json::to_string(&address)?);
        }
        SecretCommand::Get { prefix, count } => {
            let data = store.read(&store.address(prefix, *count)).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
        SecretCommand::Delete { prefix, count } => {
            let address = store.address(prefix, *count);
            store.delete(&address).await?;
            tracing::info!(
                "[credvault] deleted {} chunk(s) under {}",
                address.chunk_count,
                address.prefix
            );
        }
    }
    Ok(())
}

fn format_time(time: SystemTime) -> Option<String> {
    DateTime::from(time).fmt(DateTimeFormat::DateTime).ok()
}

/// JSON view of a credential value; key material only when asked for.
pub fn render_credentials(value: &CredentialValue, show_secrets: bool) -> serde_json::Value {
    let mut body = json!({
        "ProviderName": value.provider_name,
        "AccessKeyId": value.access_key_id,
        "Expiration": value.expiration.and_then(format_time),
    });
    if show_secrets {
        body["SecretAccessKey"] = json!(value.secret_access_key);
        body["SessionToken"] = json!(value.session_token);
    }
    body
}
