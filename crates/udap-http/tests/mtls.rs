//! TLS loopback: anchor-based server validation and client certificate
//! attachment, end to end against a local rustls server.

use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use udap_core::SessionSettings;
use udap_credentials::ClientCertificateBundle;
use udap_http::CertificateBoundHttpPipeline;
use udap_trust::AnchorCertificateSet;

struct TestCa {
    cert: rcgen::Certificate,
    key: rcgen::KeyPair,
}

fn root_ca(name: &str) -> TestCa {
    let key = rcgen::KeyPair::generate().unwrap();
    let mut params = rcgen::CertificateParams::new(Vec::new()).unwrap();
    params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, name);
    let cert = params.self_signed(&key).unwrap();
    TestCa { cert, key }
}

fn server_leaf(issuer: &TestCa) -> (Vec<u8>, Vec<u8>) {
    let key = rcgen::KeyPair::generate().unwrap();
    let params = rcgen::CertificateParams::new(vec!["127.0.0.1".to_string()]).unwrap();
    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    (cert.der().to_vec(), key.serialize_der())
}

fn client_leaf(issuer: &TestCa) -> ClientCertificateBundle {
    let key = rcgen::KeyPair::generate().unwrap();
    let mut params = rcgen::CertificateParams::new(Vec::new()).unwrap();
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "Loopback Client");
    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    ClientCertificateBundle::from_parts(cert.der().to_vec(), key.serialize_der(), Vec::new())
        .unwrap()
}

/// Accepts one TLS connection and answers any HTTP/1.1 request with 200
/// "ok". Handshake failures just drop the connection.
async fn serve_once(listener: TcpListener, acceptor: TlsAcceptor) {
    let Ok((stream, _)) = listener.accept().await else {
        return;
    };
    let Ok(mut tls) = acceptor.accept(stream).await else {
        return;
    };
    let mut buf = [0u8; 4096];
    let _ = tls.read(&mut buf).await;
    let body = "ok";
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = tls.write_all(response.as_bytes()).await;
    let _ = tls.shutdown().await;
}

fn server_acceptor(server_root: &TestCa, client_root: Option<&TestCa>) -> TlsAcceptor {
    let (leaf_der, key_der) = server_leaf(server_root);
    let chain = vec![
        CertificateDer::from(leaf_der),
        CertificateDer::from(server_root.cert.der().to_vec()),
    ];
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_der));

    let builder = rustls::ServerConfig::builder();
    let config = match client_root {
        Some(root) => {
            let mut roots = rustls::RootCertStore::empty();
            roots
                .add(CertificateDer::from(root.cert.der().to_vec()))
                .unwrap();
            let verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots))
                .build()
                .unwrap();
            builder
                .with_client_cert_verifier(verifier)
                .with_single_cert(chain, key)
                .unwrap()
        }
        None => builder
            .with_no_client_auth()
            .with_single_cert(chain, key)
            .unwrap(),
    };
    TlsAcceptor::from(Arc::new(config))
}

fn anchors_of(ca: &TestCa) -> AnchorCertificateSet {
    let mut set = AnchorCertificateSet::new();
    set.add_root_der(ca.cert.der().to_vec()).unwrap();
    set
}

#[tokio::test]
async fn server_chaining_to_loaded_anchor_is_accepted() {
    let server_root = root_ca("Loopback Server Root");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(listener, server_acceptor(&server_root, None)));

    let pipeline = CertificateBoundHttpPipeline::build(
        None,
        &anchors_of(&server_root),
        SessionSettings::default(),
    )
    .unwrap();

    let response = pipeline
        .get(&format!("https://127.0.0.1:{}/", addr.port()))
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.body.as_ref(), b"ok");
    server.await.unwrap();
}

#[tokio::test]
async fn server_outside_the_anchor_set_is_rejected() {
    let server_root = root_ca("Loopback Server Root");
    let unrelated = root_ca("Unrelated Root");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(listener, server_acceptor(&server_root, None)));

    let pipeline = CertificateBoundHttpPipeline::build(
        None,
        &anchors_of(&unrelated),
        SessionSettings::default(),
    )
    .unwrap();

    let err = pipeline
        .get(&format!("https://127.0.0.1:{}/", addr.port()))
        .await
        .unwrap_err();
    // The untrusted decision surfaces as a transport-level failure.
    assert!(err.to_string().contains("request error"), "{err}");
    server.await.unwrap();
}

#[tokio::test]
async fn client_certificate_is_attached_when_the_server_demands_one() {
    let server_root = root_ca("Loopback Server Root");
    let client_root = root_ca("Loopback Client Root");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(
        listener,
        server_acceptor(&server_root, Some(&client_root)),
    ));

    let bundle = client_leaf(&client_root);
    let pipeline = CertificateBoundHttpPipeline::build(
        Some(&bundle),
        &anchors_of(&server_root),
        SessionSettings::default(),
    )
    .unwrap();

    let response = pipeline
        .get(&format!("https://127.0.0.1:{}/", addr.port()))
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 200);
    server.await.unwrap();
}
