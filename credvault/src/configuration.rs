// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct VaultOptions {
    /// AWS region; falls back to the default region chain
    #[arg(long, env("CREDVAULT_REGION"))]
    pub region: Option<String>,
    /// JSON identity document describing static and role identities
    #[arg(long, env("CREDVAULT_IDENTITIES"))]
    pub identities: Option<PathBuf>,
    /// Identity to act as; the controller identity when omitted
    #[arg(long, env("CREDVAULT_IDENTITY"))]
    pub identity: Option<String>,
    /// Where chunked secrets are stored
    #[arg(
        long,
        value_enum,
        default_value_t = SecretBackend::SsmParameterStore,
        env("CREDVAULT_BACKEND")
    )]
    pub backend: SecretBackend,
    /// Bytes per stored chunk; the backend's item capacity when omitted
    #[arg(long, env("CREDVAULT_MAX_CHUNK_SIZE"), value_parser = parse_chunk_size)]
    pub max_chunk_size: Option<usize>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SecretBackend {
    /// SecureString parameters named `<prefix>/<i>`
    SsmParameterStore,
    /// Secrets named `<prefix>-<i>`
    SecretsManager,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Resolve the selected identity and print its credentials
    Credentials {
        #[arg(long, default_value = "false", action = ArgAction::SetTrue)]
        show_secrets: bool,
    },
    /// Manage chunked secrets in the parameter store
    #[command(subcommand)]
    Secret(SecretCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum SecretCommand {
    /// Store a file as a chunk set and print its address
    Put {
        /// Parameter path prefix; a unique one is generated when empty
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        cluster: String,
        #[arg(long, default_value = "node")]
        role: String,
        /// Additional KEY=VALUE tags
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
    /// Reassemble a chunk set and write it to stdout
    Get {
        #[arg(long)]
        prefix: String,
        #[arg(long)]
        count: usize,
    },
    /// Delete every chunk of a set
    Delete {
        #[arg(long)]
        prefix: String,
        #[arg(long)]
        count: usize,
    },
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|err| format!("invalid chunk size {value:?}: {err}"))?;
    if size == 0 {
        return Err("chunk size must be at least 1 byte".to_string());
    }
    Ok(size)
}

fn parse_tag(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid tag {value:?}, expected KEY=VALUE")),
    }
}
