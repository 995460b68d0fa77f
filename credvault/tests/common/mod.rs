// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! In-memory stand-ins for STS and the secret stores shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use credvault::errors::{CredentialError, ErrorKind, RemoteError};
use credvault::models::{AssumeRoleRequest, CredentialValue, ParameterRecord, StoreLayout};
use credvault::ssm::ParameterStore;
use credvault::sts::TrustBroker;

pub const ONE_HOUR: Duration = Duration::from_secs(3600);

/// One `AssumeRole` call as seen by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeCall {
    pub role_arn: String,
    pub source_access_key_id: String,
    pub external_id: Option<String>,
    pub policy: Option<String>,
}

/// Issues credentials named `<role_arn>-AccessKeyID-<call number>`.
pub struct FakeTrustBroker {
    calls: Mutex<Vec<AssumeCall>>,
    ttls: Mutex<HashMap<String, Duration>>,
    denied: Mutex<HashSet<String>>,
    latency: Duration,
}

impl Default for FakeTrustBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTrustBroker {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            ttls: Mutex::new(HashMap::new()),
            denied: Mutex::new(HashSet::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Lifetime of credentials issued for `role_arn`; one hour by default.
    pub fn set_ttl(&self, role_arn: &str, ttl: Duration) {
        self.ttls.lock().unwrap().insert(role_arn.to_string(), ttl);
    }

    pub fn deny(&self, role_arn: &str) {
        self.denied.lock().unwrap().insert(role_arn.to_string());
    }

    pub fn allow(&self, role_arn: &str) {
        self.denied.lock().unwrap().remove(role_arn);
    }

    pub fn calls(&self) -> Vec<AssumeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn roles_assumed(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.role_arn).collect()
    }
}

#[async_trait]
impl TrustBroker for FakeTrustBroker {
    async fn assume_role(
        &self,
        source: &CredentialValue,
        request: &AssumeRoleRequest,
    ) -> Result<CredentialValue, CredentialError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(AssumeCall {
                role_arn: request.role_arn.clone(),
                source_access_key_id: source.access_key_id.clone(),
                external_id: request.external_id.clone(),
                policy: request.policy.clone(),
            });
            calls.len()
        };

        if self.denied.lock().unwrap().contains(&request.role_arn) {
            return Err(CredentialError::AssumeRole {
                role_arn: request.role_arn.clone(),
                source: RemoteError::new(
                    ErrorKind::Fatal,
                    "AccessDenied",
                    "not authorized to perform sts:AssumeRole",
                ),
            });
        }

        let ttl = self
            .ttls
            .lock()
            .unwrap()
            .get(&request.role_arn)
            .copied()
            .unwrap_or(ONE_HOUR);

        Ok(CredentialValue::new(
            format!("{}-AccessKeyID-{}", request.role_arn, count),
            format!("{}-SecretAccessKey-{}", request.role_arn, count),
            format!("{}-SessionToken-{}", request.role_arn, count),
            "FakeTrustBroker",
            Some(SystemTime::now() + ttl),
        ))
    }
}

pub fn remote(kind: ErrorKind, code: &str, message: &str) -> RemoteError {
    RemoteError::new(kind, code, message)
}

/// Parameter store keeping records in memory.
///
/// Scripted put results are consumed one per call before the default
/// behaviour (create, or conflict if the name exists) applies.
pub struct FakeParameterStore {
    layout: StoreLayout,
    conflict_code: &'static str,
    not_found_code: &'static str,
    parameters: Mutex<BTreeMap<String, ParameterRecord>>,
    put_script: Mutex<VecDeque<Result<(), RemoteError>>>,
    delete_errors: Mutex<HashMap<String, RemoteError>>,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    gets: Mutex<Vec<String>>,
}

impl Default for FakeParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeParameterStore {
    /// Names and errors as SSM Parameter Store reports them.
    pub fn new() -> Self {
        Self::with_layout(
            StoreLayout::PARAMETER_STORE,
            "ParameterAlreadyExists",
            "ParameterNotFound",
        )
    }

    /// Names and errors as Secrets Manager reports them.
    pub fn secrets_manager() -> Self {
        Self::with_layout(
            StoreLayout::SECRETS_MANAGER,
            "ResourceExistsException",
            "ResourceNotFoundException",
        )
    }

    fn with_layout(
        layout: StoreLayout,
        conflict_code: &'static str,
        not_found_code: &'static str,
    ) -> Self {
        Self {
            layout,
            conflict_code,
            not_found_code,
            parameters: Mutex::new(BTreeMap::new()),
            put_script: Mutex::new(VecDeque::new()),
            delete_errors: Mutex::new(HashMap::new()),
            puts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
        }
    }

    pub fn script_put(&self, result: Result<(), RemoteError>) {
        self.put_script.lock().unwrap().push_back(result);
    }

    pub fn fail_delete(&self, name: &str, err: RemoteError) {
        self.delete_errors
            .lock()
            .unwrap()
            .insert(name.to_string(), err);
    }

    pub fn insert(&self, record: ParameterRecord) {
        self.parameters
            .lock()
            .unwrap()
            .insert(record.name.clone(), record);
    }

    pub fn remove(&self, name: &str) {
        self.parameters.lock().unwrap().remove(name);
    }

    pub fn records(&self) -> Vec<ParameterRecord> {
        self.parameters.lock().unwrap().values().cloned().collect()
    }

    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.puts().len() + self.deletes().len() + self.gets().len()
    }
}

#[async_trait]
impl ParameterStore for FakeParameterStore {
    fn layout(&self) -> StoreLayout {
        self.layout
    }

    async fn put_parameter(&self, record: &ParameterRecord) -> Result<(), RemoteError> {
        self.puts.lock().unwrap().push(record.name.clone());

        let scripted = self.put_script.lock().unwrap().pop_front();
        let mut parameters = self.parameters.lock().unwrap();
        match scripted {
            Some(Err(err)) => Err(err),
            Some(Ok(())) | None => {
                if parameters.contains_key(&record.name) {
                    return Err(remote(ErrorKind::Conflict, self.conflict_code, "already exists"));
                }
                parameters.insert(record.name.clone(), record.clone());
                Ok(())
            }
        }
    }

    async fn delete_parameter(&self, name: &str) -> Result<(), RemoteError> {
        self.deletes.lock().unwrap().push(name.to_string());

        if let Some(err) = self.delete_errors.lock().unwrap().get(name) {
            return Err(err.clone());
        }
        match self.parameters.lock().unwrap().remove(name) {
            Some(_) => Ok(()),
            None => Err(remote(ErrorKind::NotFound, self.not_found_code, "not found")),
        }
    }

    async fn get_parameter(&self, name: &str) -> Result<Option<String>, RemoteError> {
        self.gets.lock().unwrap().push(name.to_string());

        match self.parameters.lock().unwrap().get(name) {
            Some(record) => Ok(Some(record.value.clone())),
            None => Err(remote(ErrorKind::NotFound, self.not_found_code, "not found")),
        }
    }
}
