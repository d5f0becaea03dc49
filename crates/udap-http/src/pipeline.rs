//! The certificate-bound pipeline: session state in, configured client
//! out.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, HeaderMap};
use rustls::ClientConfig;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use udap_core::{SessionContext, SessionSettings};
use udap_credentials::{ClientCertificateBundle, CredentialSession};
use udap_store::SessionStore;
use udap_trust::{AnchorCertificateSet, TrustAnchorValidator};

use crate::counting::{ContentEncoding, TransferDiagnostics, decode_body};
use crate::error::PipelineError;
use crate::verifier::AnchorCertVerifier;

/// A response with its body fully read, decoded and accounted.
#[derive(Debug)]
pub struct PipelineResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers; `Content-Encoding` is removed once the body has
    /// been decoded so downstream consumers never see compressed bytes.
    pub headers: HeaderMap,
    /// The (decoded) body.
    pub body: Bytes,
    /// Transfer accounting for this exchange.
    pub diagnostics: TransferDiagnostics,
}

impl PipelineResponse {
    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Outbound HTTP transport bound to one session's credential state.
///
/// Built once per session snapshot; rebuilding after a credential or
/// anchor change picks up the new state. Custom trust is opt-in: with no
/// anchors configured the transport validates servers against the
/// standard webpki root set, and with no client certificate it connects
/// anonymously.
#[derive(Debug, Clone)]
pub struct CertificateBoundHttpPipeline {
    client: reqwest::Client,
    decompression_enabled: bool,
}

fn identity_parts(
    bundle: &ClientCertificateBundle,
) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
    let mut certs: Vec<CertificateDer<'static>> =
        vec![CertificateDer::from(bundle.certificate_der().to_vec())];
    certs.extend(
        bundle
            .chain_der()
            .iter()
            .map(|der| CertificateDer::from(der.clone())),
    );
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(bundle.private_key_der().to_vec()));
    (certs, key)
}

impl CertificateBoundHttpPipeline {
    /// Builds a pipeline from the session's current credential state.
    pub async fn for_session<S: SessionStore>(
        session: &CredentialSession<S>,
        ctx: &SessionContext,
    ) -> Result<Self, PipelineError> {
        let bundle = session.client_certificate(ctx).await?;
        let anchors = session.anchor_set(ctx).await?;
        let settings = session.settings(ctx).await?;
        Self::build(bundle.as_ref(), &anchors, settings)
    }

    /// Builds a pipeline from explicit parts.
    pub fn build(
        bundle: Option<&ClientCertificateBundle>,
        anchors: &AnchorCertificateSet,
        settings: SessionSettings,
    ) -> Result<Self, PipelineError> {
        let builder = reqwest::Client::builder();

        let client = if bundle.is_none() && anchors.is_empty() {
            // Nothing session-specific to wire in; plain client with
            // default validation.
            builder.build()?
        } else {
            let tls = Self::tls_config(bundle, anchors)?;
            builder.use_preconfigured_tls(tls).build()?
        };

        debug!(
            client_certificate = bundle.is_some(),
            anchors = anchors.len(),
            decompression = settings.decompression_enabled,
            "built certificate-bound client"
        );
        Ok(Self {
            client,
            decompression_enabled: settings.decompression_enabled,
        })
    }

    fn tls_config(
        bundle: Option<&ClientCertificateBundle>,
        anchors: &AnchorCertificateSet,
    ) -> Result<ClientConfig, PipelineError> {
        let wants_cert = if anchors.is_empty() {
            // No anchors loaded: default validation against the standard
            // webpki roots.
            let mut roots = rustls::RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            ClientConfig::builder().with_root_certificates(roots)
        } else {
            let validator = TrustAnchorValidator::new(anchors)?;
            let verifier = Arc::new(AnchorCertVerifier::new(validator));
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(verifier)
        };

        match bundle {
            Some(bundle) => {
                let (certs, key) = identity_parts(bundle);
                wants_cert
                    .with_client_auth_cert(certs, key)
                    .map_err(|e| PipelineError::tls(e.to_string()))
            }
            None => Ok(wants_cert.with_no_client_auth()),
        }
    }

    /// The configured HTTP client, for callers that need request shapes
    /// this pipeline does not wrap.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Whether responses will be transparently decompressed.
    pub fn decompression_enabled(&self) -> bool {
        self.decompression_enabled
    }

    /// Convenience GET.
    pub async fn get(&self, url: &str) -> Result<PipelineResponse, PipelineError> {
        self.execute(self.client.get(url)).await
    }

    /// Sends a request with the session's transfer policy applied and
    /// reads the response body fully.
    ///
    /// With decompression enabled the request advertises `gzip, deflate`
    /// and declared encodings are decoded (with byte accounting) before
    /// the response is returned, the `Content-Encoding` header stripped.
    /// With it disabled the request advertises `identity` and whatever
    /// arrives passes through byte-for-byte — deliberately including a
    /// server that compresses anyway, so misbehavior stays visible to
    /// the caller.
    pub async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<PipelineResponse, PipelineError> {
        let accept = if self.decompression_enabled {
            "gzip, deflate"
        } else {
            "identity"
        };
        let response = request.header(ACCEPT_ENCODING, accept).send().await?;

        let status = response.status();
        let mut headers = response.headers().clone();
        let declared = headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let raw = response.bytes().await?;

        if !self.decompression_enabled {
            let len = raw.len() as u64;
            let encoding = ContentEncoding::parse(&declared);
            return Ok(PipelineResponse {
                status,
                headers,
                body: raw,
                diagnostics: TransferDiagnostics::passthrough(encoding, len),
            });
        }

        let (body, diagnostics) = decode_body(&declared, raw)?;
        if !matches!(diagnostics.encoding, ContentEncoding::Other(_)) {
            headers.remove(CONTENT_ENCODING);
        }
        Ok(PipelineResponse {
            status,
            headers,
            body,
            diagnostics,
        })
    }
}
