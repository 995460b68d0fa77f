// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Error types shared by the credential chain and the secret store.
//!
//! Remote failures are reduced to a [`RemoteError`] carrying a closed
//! [`ErrorKind`] at the transport boundary (see [`classify_sdk_error`]), so the
//! retry and ignore rules of the secret store never look at SDK types.

use std::fmt;

use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_smithy_runtime_api::client::result::SdkError;

use crate::constants::{MAX_ROLE_DURATION_SECONDS, MIN_ROLE_DURATION_SECONDS};

/// How a remote failure should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The store is temporarily over capacity or throttling; retrying may succeed.
    Transient,
    /// A record already exists at the requested name.
    Conflict,
    /// The addressed record does not exist.
    NotFound,
    /// Anything else, including timeouts and authorization failures.
    Fatal,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("api error {code}: {message}")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Transient
    }
}

/// Maps a parameter store error code onto an [`ErrorKind`].
pub fn classify_parameter_store_code(code: &str) -> ErrorKind {
    match code {
        "ParameterAlreadyExists" => ErrorKind::Conflict,
        "ParameterLimitExceeded" | "ThrottlingException" | "TooManyUpdates" => {
            ErrorKind::Transient
        }
        "ParameterNotFound" => ErrorKind::NotFound,
        _ => ErrorKind::Fatal,
    }
}

/// Maps a Secrets Manager error code onto an [`ErrorKind`].
pub fn classify_secrets_manager_code(code: &str) -> ErrorKind {
    match code {
        "ResourceExistsException" => ErrorKind::Conflict,
        "LimitExceededException" | "ThrottlingException" => ErrorKind::Transient,
        "ResourceNotFoundException" => ErrorKind::NotFound,
        _ => ErrorKind::Fatal,
    }
}

/// Reduces an SDK error to a [`RemoteError`].
///
/// Service errors are classified by their error code with the service's own
/// `classify` table. Construction, dispatch, timeout and response errors never
/// reached a service decision and are always [`ErrorKind::Fatal`].
pub fn classify_sdk_error<E, R>(
    err: &SdkError<E, R>,
    classify: fn(&str) -> ErrorKind,
) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    let code = match err {
        SdkError::ServiceError(_) => err.code().unwrap_or("Unknown"),
        SdkError::TimeoutError(_) => "Timeout",
        SdkError::DispatchFailure(_) => "DispatchFailure",
        SdkError::ConstructionFailure(_) => "ConstructionFailure",
        SdkError::ResponseError(_) => "ResponseError",
        _ => "Unknown",
    };
    let kind = match err {
        SdkError::ServiceError(_) => classify(code),
        _ => ErrorKind::Fatal,
    };
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(err).to_string(),
    };

    RemoteError::new(kind, code, message)
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CredentialError {
    #[error("unable to assume role {role_arn}: {source}")]
    AssumeRole {
        role_arn: String,
        #[source]
        source: RemoteError,
    },
    #[error("assume role {0} returned no credentials")]
    MissingCredentials(String),
    #[error("invalid credential expiration: {0}")]
    InvalidExpiration(String),
    #[error("credential provider {name} failed: {message}")]
    Provider { name: String, message: String },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("duplicate identity: {0}")]
    DuplicateIdentity(String),
    #[error("identity {identity} references unknown source {source_name}")]
    UnknownSource {
        identity: String,
        source_name: String,
    },
    #[error("identity cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    #[error(
        "identity {identity} requests {duration}s, allowed range is {}..={}",
        MIN_ROLE_DURATION_SECONDS,
        MAX_ROLE_DURATION_SECONDS
    )]
    InvalidDuration { identity: String, duration: i32 },
    #[error("identity not found: {0}")]
    NotFound(String),
    #[error("unable to parse identity document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unable to read identity document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk size must be at least 1 byte")]
    InvalidChunkSize,
    #[error("chunk {found} out of order, expected {expected}")]
    OutOfOrder { expected: usize, found: usize },
    #[error("unable to decode chunked payload: {0}")]
    Decode(String),
}

/// Every non-ignorable failure of a chunk set deletion, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteError {
    pub errors: Vec<RemoteError>,
}

impl fmt::Display for DeleteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{err}")?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for DeleteError {}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SecretError {
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    #[error(
        "failed to write chunk {index} under {prefix} after {attempts} attempt(s) \
         ({written} chunk(s) written): {source}"
    )]
    Write {
        prefix: String,
        index: usize,
        attempts: u32,
        written: usize,
        #[source]
        source: RemoteError,
    },
    #[error(transparent)]
    Delete(#[from] DeleteError),
    #[error("failed to read parameter {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: RemoteError,
    },
    #[error("parameter {0} has no value")]
    MissingValue(String),
}
