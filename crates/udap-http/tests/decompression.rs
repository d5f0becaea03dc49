//! Transfer-decoding behavior of the pipeline against a mock server.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use udap_core::{SessionContext, SessionSettings};
use udap_credentials::CredentialSession;
use udap_http::{CertificateBoundHttpPipeline, ContentEncoding, PipelineError};
use udap_store::MemorySessionStore;
use udap_trust::AnchorCertificateSet;
use wiremock::matchers::{header, headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn pipeline(settings: SessionSettings) -> CertificateBoundHttpPipeline {
    CertificateBoundHttpPipeline::build(None, &AnchorCertificateSet::new(), settings).unwrap()
}

#[tokio::test]
async fn disabled_toggle_advertises_identity_and_passes_bodies_through() {
    let server = MockServer::start().await;
    let compressed = gzip(b"should stay compressed");

    // The mock only matches when the request advertises identity.
    Mock::given(method("GET"))
        .and(path("/payload"))
        .and(header("accept-encoding", "identity"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(compressed.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(SessionSettings::default());
    let response = pipeline
        .get(&format!("{}/payload", server.uri()))
        .await
        .unwrap();

    // Pass-through: the body is exactly the wire bytes, encoding intact.
    assert_eq!(response.body.as_ref(), compressed.as_slice());
    assert_eq!(response.diagnostics.encoding, ContentEncoding::Gzip);
    assert_eq!(
        response.diagnostics.compressed_bytes,
        response.diagnostics.decompressed_bytes
    );
    assert!(response.headers.contains_key("content-encoding"));
}

#[tokio::test]
async fn gzip_response_decodes_with_exact_byte_counts() {
    let server = MockServer::start().await;
    let plaintext = b"a FHIR capability statement, say, repeated enough to compress well "
        .repeat(40);
    let wire = gzip(&plaintext);
    let wire_len = wire.len() as u64;

    Mock::given(method("GET"))
        .and(path("/payload"))
        .and(headers("accept-encoding", vec!["gzip", "deflate"]))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(wire),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(SessionSettings::with_decompression());
    let response = pipeline
        .get(&format!("{}/payload", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.body.as_ref(), plaintext.as_slice());
    assert_eq!(response.diagnostics.compressed_bytes, wire_len);
    assert_eq!(
        response.diagnostics.decompressed_bytes,
        plaintext.len() as u64
    );
    // Downstream consumers never see compressed bytes.
    assert!(!response.headers.contains_key("content-encoding"));
}

#[tokio::test]
async fn plain_response_with_decompression_enabled_is_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"plain body".to_vec()))
        .mount(&server)
        .await;

    let pipeline = pipeline(SessionSettings::with_decompression());
    let response = pipeline
        .get(&format!("{}/plain", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.body.as_ref(), b"plain body");
    assert_eq!(response.diagnostics.encoding, ContentEncoding::Identity);
    assert_eq!(response.diagnostics.compressed_bytes, 10);
    assert_eq!(response.diagnostics.decompressed_bytes, 10);
}

#[tokio::test]
async fn corrupt_gzip_surfaces_as_decompress_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(b"definitely not gzip".to_vec()),
        )
        .mount(&server)
        .await;

    let pipeline = pipeline(SessionSettings::with_decompression());
    let err = pipeline
        .get(&format!("{}/broken", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Decompress { .. }), "{err}");
}

#[tokio::test]
async fn pipeline_builds_from_session_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(br#"{"resourceType":"Bundle"}"#.to_vec()),
        )
        .mount(&server)
        .await;

    let session = CredentialSession::new(MemorySessionStore::new());
    let ctx = SessionContext::new("s1");
    session
        .set_settings(&ctx, SessionSettings::with_decompression())
        .await
        .unwrap();

    let pipeline = CertificateBoundHttpPipeline::for_session(&session, &ctx)
        .await
        .unwrap();
    assert!(pipeline.decompression_enabled());

    let response = pipeline
        .get(&format!("{}/json", server.uri()))
        .await
        .unwrap();
    let value: serde_json::Value = response.json().unwrap();
    assert_eq!(value["resourceType"], "Bundle");
}
