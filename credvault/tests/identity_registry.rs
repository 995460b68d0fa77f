// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use std::sync::Arc;

use aws_credential_types::Credentials;
use common::FakeTrustBroker;
use credvault::errors::ConfigError;
use credvault::identity::{
    ControllerPrincipalProvider, IdentityDocument, IdentitySpec, PrincipalRegistry,
    SharedPrincipal, StaticPrincipalProvider,
};

const ROOT_ROLE: &str = "arn:aws:iam::123456789012:role/root";
const OPS_ROLE: &str = "arn:aws:iam::123456789012:role/ops";
const AUDIT_ROLE: &str = "arn:aws:iam::123456789012:role/audit";

fn controller() -> SharedPrincipal {
    Arc::new(ControllerPrincipalProvider::new(Credentials::new(
        "controller-AccessKeyID",
        "controller-SecretAccessKey",
        None,
        None,
        "test",
    )))
}

fn static_spec(name: &str) -> IdentitySpec {
    IdentitySpec::Static {
        name: name.to_string(),
        access_key_id: format!("{name}-AccessKeyID"),
        secret_access_key: format!("{name}-SecretAccessKey"),
        session_token: String::new(),
    }
}

fn role_spec(name: &str, role_arn: &str, source: Option<&str>) -> IdentitySpec {
    IdentitySpec::Role {
        name: name.to_string(),
        role_arn: role_arn.to_string(),
        session_name: name.to_string(),
        duration_seconds: 900,
        external_id: None,
        inline_policy: None,
        source: source.map(str::to_string),
    }
}

fn build(
    identities: Vec<IdentitySpec>,
    broker: &Arc<FakeTrustBroker>,
) -> Result<PrincipalRegistry, ConfigError> {
    PrincipalRegistry::build(
        &IdentityDocument { identities },
        controller(),
        broker.clone(),
    )
}

// =============================================================================
// Document parsing
// =============================================================================

/// Optional fields fall back to their defaults.
#[test]
fn test_document_defaults() {
    let document = IdentityDocument::from_json(
        br#"{
            "identities": [
                {"kind": "static", "name": "root", "access_key_id": "AKID", "secret_access_key": "SECRET"},
                {"kind": "role", "name": "ops", "role_arn": "arn:aws:iam::123456789012:role/ops",
                 "session_name": "ops", "source": "root"}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(
        document.identities[0],
        IdentitySpec::Static {
            name: "root".into(),
            access_key_id: "AKID".into(),
            secret_access_key: "SECRET".into(),
            session_token: String::new(),
        }
    );
    match &document.identities[1] {
        IdentitySpec::Role {
            duration_seconds,
            external_id,
            inline_policy,
            source,
            ..
        } => {
            assert_eq!(*duration_seconds, 900);
            assert_eq!(*external_id, None);
            assert_eq!(*inline_policy, None);
            assert_eq!(source.as_deref(), Some("root"));
        }
        other => panic!("unexpected identity: {other:?}"),
    }
}

#[test]
fn test_document_rejects_unknown_kind() {
    let result = IdentityDocument::from_json(br#"{"identities": [{"kind": "web", "name": "x"}]}"#);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[tokio::test]
async fn test_missing_document_is_an_io_error() {
    let result = IdentityDocument::load("/nonexistent/credvault/identities.json").await;
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

// =============================================================================
// Graph construction
// =============================================================================

/// Every name maps to one provider; roles naming the same source share it.
#[tokio::test]
async fn test_shared_source_is_one_provider() {
    let broker = Arc::new(FakeTrustBroker::new());
    let registry = build(
        vec![
            static_spec("static"),
            role_spec("root", ROOT_ROLE, Some("static")),
            role_spec("ops", OPS_ROLE, Some("root")),
            role_spec("audit", AUDIT_ROLE, Some("root")),
        ],
        &broker,
    )
    .unwrap();

    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["audit", "default", "ops", "root", "static"]
    );

    registry.get("ops").unwrap().retrieve().await.unwrap();
    registry.get("audit").unwrap().retrieve().await.unwrap();

    assert_eq!(
        broker.roles_assumed(),
        vec![ROOT_ROLE, OPS_ROLE, AUDIT_ROLE]
    );
    assert_eq!(broker.calls()[0].source_access_key_id, "static-AccessKeyID");
}

/// Roles without a source are assumed from the controller principal.
#[tokio::test]
async fn test_role_without_source_uses_controller() {
    let broker = Arc::new(FakeTrustBroker::new());
    let registry = build(
        vec![
            role_spec("root", ROOT_ROLE, None),
            role_spec("ops", OPS_ROLE, Some("default")),
        ],
        &broker,
    )
    .unwrap();

    registry.get("root").unwrap().retrieve().await.unwrap();
    registry.get("ops").unwrap().retrieve().await.unwrap();

    let calls = broker.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        assert_eq!(call.source_access_key_id, "controller-AccessKeyID");
    }

    let controller = registry.get("default").unwrap().retrieve().await.unwrap();
    assert_eq!(controller.provider_name, "ControllerProvider");
}

#[test]
fn test_unknown_source() {
    let broker = Arc::new(FakeTrustBroker::new());
    let result = build(vec![role_spec("ops", OPS_ROLE, Some("missing"))], &broker);

    match result {
        Err(ConfigError::UnknownSource {
            identity,
            source_name,
        }) => {
            assert_eq!(identity, "ops");
            assert_eq!(source_name, "missing");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an unknown source error"),
    }
}

#[test]
fn test_cycle_is_rejected() {
    let broker = Arc::new(FakeTrustBroker::new());
    let result = build(
        vec![
            role_spec("a", ROOT_ROLE, Some("b")),
            role_spec("b", OPS_ROLE, Some("c")),
            role_spec("c", AUDIT_ROLE, Some("a")),
        ],
        &broker,
    );

    match result {
        Err(ConfigError::Cycle(path)) => assert_eq!(path, vec!["a", "b", "c", "a"]),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a cycle error"),
    }
}

#[test]
fn test_self_reference_is_a_cycle() {
    let broker = Arc::new(FakeTrustBroker::new());
    let result = build(vec![role_spec("loop", ROOT_ROLE, Some("loop"))], &broker);

    let err = result.err().unwrap();
    assert_eq!(err.to_string(), "identity cycle detected: loop -> loop");
}

#[test]
fn test_duplicate_and_reserved_names() {
    let broker = Arc::new(FakeTrustBroker::new());

    let duplicate = build(vec![static_spec("root"), static_spec("root")], &broker);
    assert!(matches!(duplicate, Err(ConfigError::DuplicateIdentity(name)) if name == "root"));

    let reserved = build(vec![static_spec("default")], &broker);
    assert!(matches!(reserved, Err(ConfigError::DuplicateIdentity(name)) if name == "default"));
}

#[test]
fn test_duration_out_of_range() {
    let broker = Arc::new(FakeTrustBroker::new());
    for duration in [0, 899, 43_201] {
        let spec = IdentitySpec::Role {
            name: "ops".into(),
            role_arn: OPS_ROLE.into(),
            session_name: "ops".into(),
            duration_seconds: duration,
            external_id: None,
            inline_policy: None,
            source: None,
        };
        let result = build(vec![spec], &broker);
        assert!(
            matches!(result, Err(ConfigError::InvalidDuration { duration: d, .. }) if d == duration)
        );
    }
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn test_get_unknown_name() {
    let broker = Arc::new(FakeTrustBroker::new());
    let registry = build(vec![static_spec("root")], &broker).unwrap();

    assert!(matches!(registry.get("ops"), Err(ConfigError::NotFound(name)) if name == "ops"));
}

/// An equivalent provider built elsewhere resolves to the registered one,
/// keeping its cache.
#[tokio::test]
async fn test_dedup_returns_registered_provider() {
    let broker = Arc::new(FakeTrustBroker::new());
    let registry = build(vec![static_spec("root")], &broker).unwrap();
    let registered = registry.get("root").unwrap();

    let rebuilt: SharedPrincipal = Arc::new(StaticPrincipalProvider::new(
        "root",
        "root-AccessKeyID",
        "root-SecretAccessKey",
        "",
    ));
    assert!(Arc::ptr_eq(&registry.dedup(rebuilt), &registered));

    let fresh: SharedPrincipal = Arc::new(StaticPrincipalProvider::new(
        "other",
        "other-AccessKeyID",
        "other-SecretAccessKey",
        "",
    ));
    let deduped = registry.dedup(fresh.clone());
    assert!(Arc::ptr_eq(&deduped, &fresh));
    assert!(Arc::ptr_eq(&registry.dedup(fresh), &deduped));
}
