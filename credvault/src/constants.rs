// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const STATIC_PROVIDER_NAME: &str = "StaticProvider";
pub const ASSUME_ROLE_PROVIDER_NAME: &str = "AssumeRoleProvider";
pub const CONTROLLER_PROVIDER_NAME: &str = "ControllerProvider";
pub const CONTROLLER_IDENTITY_NAME: &str = "default";

pub const CREDENTIAL_REFRESH_BUFFER: Duration = Duration::from_secs(60); // refresh 60s before expiry

/// https://docs.aws.amazon.com/STS/latest/APIReference/API_AssumeRole.html
pub const MIN_ROLE_DURATION_SECONDS: i32 = 900;
pub const MAX_ROLE_DURATION_SECONDS: i32 = 43200;
pub const DEFAULT_ROLE_DURATION_SECONDS: i32 = 900;

/// https://docs.aws.amazon.com/systems-manager/latest/userguide/parameter-store-advanced-parameters.html
/// standard tier parameters hold at most 4 KB
pub const MAX_PARAMETER_SIZE: usize = 4096;
pub const PATH_SEPARATOR: char = '/';

/// https://docs.aws.amazon.com/secretsmanager/latest/userguide/reference_limits.html
/// kept well below the 10 KB a secret value used to be limited to
pub const MAX_SECRET_SIZE: usize = 7000;
pub const SECRET_NAME_SEPARATOR: char = '-';

/// Root of the prefixes generated when a caller supplies none.
pub const DEFAULT_PREFIX_ROOT: &str = "credvault.io";

// Tag conventions for parameters written by the secret store
pub const NAME_TAG_KEY: &str = "Name";
pub const CLUSTER_TAG_PREFIX: &str = "credvault.io/cluster/";
pub const ROLE_TAG_KEY: &str = "credvault.io/role";
pub const OWNED_TAG_VALUE: &str = "owned";

// Retry policy for transient parameter store errors
pub const RETRY_MAX_ATTEMPTS: u32 = 8;
pub const RETRY_INITIAL_BACKOFF: Duration = Duration::from_millis(100);
pub const RETRY_MAX_BACKOFF: Duration = Duration::from_secs(5);
