//! Trust policies exercised against a real TLS handshake.

mod common;

use common::{client_config, spawn_tls_server, unrelated_ca_bundle};
use lab_shared::tls_client::{TransportKind, TrustPolicy, build_transport};
use serde_json::Value;

#[tokio::test]
async fn test_custom_ca_transport_trusts_issued_certificate() {
    let server = spawn_tls_server().await;
    let bundle = server.ca_bundle();

    let transport = build_transport(
        &TrustPolicy::CustomCa(bundle.path().to_path_buf()),
        &client_config(),
    )
    .unwrap();
    assert_eq!(transport.kind(), TransportKind::CustomCa);

    let response = transport
        .client()
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_system_default_transport_rejects_private_ca() {
    let server = spawn_tls_server().await;

    let transport = build_transport(&TrustPolicy::SystemDefault, &client_config()).unwrap();
    let result = transport.client().get(server.url("/health")).send().await;
    assert!(result.is_err(), "handshake should fail: {result:?}");
}

#[tokio::test]
async fn test_custom_ca_transport_rejects_other_issuers() {
    let server = spawn_tls_server().await;
    let bundle = unrelated_ca_bundle();

    let transport = build_transport(
        &TrustPolicy::CustomCa(bundle.path().to_path_buf()),
        &client_config(),
    )
    .unwrap();
    let result = transport.client().get(server.url("/health")).send().await;
    assert!(result.is_err(), "handshake should fail: {result:?}");
}

#[tokio::test]
async fn test_skip_verify_transport_accepts_any_certificate() {
    let server = spawn_tls_server().await;

    let transport = build_transport(&TrustPolicy::SkipVerify, &client_config()).unwrap();
    assert_eq!(transport.kind(), TransportKind::SkipVerify);

    let response = transport
        .client()
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}
