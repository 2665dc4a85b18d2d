//! A local HTTPS server whose certificate is issued by a throwaway CA.
#![allow(dead_code)]

use axum::{Json, Router, routing::get};
use axum_server::tls_rustls::RustlsConfig;
use lab_shared::tls_client::TlsClientConfig;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyUsagePurpose, SanType,
};
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use serde_json::json;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct TlsServer {
    pub addr: SocketAddr,
    ca_pem: String,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TlsServer {
    pub fn url(&self, path: &str) -> String {
        format!("https://127.0.0.1:{}{}", self.addr.port(), path)
    }

    /// Write the issuing CA to a PEM file usable as a `ca_cert` bundle.
    pub fn ca_bundle(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(self.ca_pem.as_bytes()).unwrap();
        file
    }
}

impl Drop for TlsServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn generate_ca(name: &str) -> Certificate {
    let mut params = CertificateParams::new(Vec::<String>::new());
    params.distinguished_name.push(DnType::CommonName, name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    Certificate::from_params(params).unwrap()
}

/// PEM of a CA that signed nothing the server presents.
pub fn unrelated_ca_bundle() -> NamedTempFile {
    let ca = generate_ca("Lab Unrelated CA");
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(ca.serialize_pem().unwrap().as_bytes()).unwrap();
    file
}

fn server_config(ca: &Certificate) -> ServerConfig {
    let mut params = CertificateParams::new(vec!["localhost".to_string()]);
    params.distinguished_name.push(DnType::CommonName, "Lab Test Server");
    params
        .subject_alt_names
        .push(SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    let server = Certificate::from_params(params).unwrap();

    let chain = vec![CertificateDer::from(server.serialize_der_with_signer(ca).unwrap())];
    let key = PrivateKeyDer::try_from(server.serialize_private_key_der()).unwrap();

    ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .unwrap()
}

pub async fn spawn_tls_server() -> TlsServer {
    let ca = generate_ca("Lab Test CA");
    let rustls_config = RustlsConfig::from_config(Arc::new(server_config(&ca)));

    let app = Router::new().route("/health", get(|| async { Json(json!({"status": "ok"})) }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let std_listener = listener.into_std().unwrap();

    let handle = tokio::spawn(async move {
        axum_server::from_tcp_rustls(std_listener, rustls_config)
            .serve(app.into_make_service())
            .await
    });

    TlsServer {
        addr,
        ca_pem: ca.serialize_pem().unwrap(),
        handle,
    }
}

/// Direct connections only, so a proxy in the environment cannot interfere.
pub fn client_config() -> TlsClientConfig {
    TlsClientConfig {
        proxy_from_env: false,
        ..Default::default()
    }
    .with_timeout(Duration::from_secs(10))
}
