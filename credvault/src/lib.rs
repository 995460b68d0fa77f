// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # credvault
//!
//! Short-lived AWS credentials through chains of assumed roles, and secrets
//! larger than a single SSM parameter stored as chunk sets.
//!
//! ## Architecture
//!
//! ```text
//! StaticPrincipal / ControllerPrincipal
//!        |
//!        +-> RolePrincipal -> RolePrincipal ...   (sts:AssumeRole, cached)
//!
//! payload -> chunker (base64, split) -> SecretStore -> ssm:PutParameter <prefix>/<i>
//!                                                  or secretsmanager:CreateSecret <prefix>-<i>
//! ```
//!
//! ## Modules
//!
//! - [`application`]: wiring of the command-line entry point
//! - [`chunker`]: bounded splitting and reassembly of payloads
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: provider names, size limits and retry settings
//! - [`errors`]: error types and remote error classification
//! - [`identity`]: static, controller and role providers, and the registry
//!   that composes them
//! - [`models`]: credential values, chunks, parameter records and addresses
//! - [`secrets`]: chunked secret create, read and delete
//! - [`secretsmanager`]: Secrets Manager as an alternative chunk store
//! - [`ssm`]: parameter store transport
//! - [`sts`]: role assumption transport
//!
//! ## Security Considerations
//!
//! - Credential values are zeroized on drop and redacted from `Debug` output
//! - Role credentials are refreshed 60 seconds before expiry by default
//! - Chunks are written as `SecureString` parameters and never overwritten

pub mod application;
pub mod chunker;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod identity;
pub mod models;
pub mod secrets;
pub mod secretsmanager;
pub mod ssm;
pub mod sts;
