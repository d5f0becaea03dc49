//! The credential session: typed access to per-session stored state.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;
use udap_core::{SessionContext, SessionSettings};
use udap_store::{ChunkedStore, SessionStore};
use udap_trust::AnchorCertificateSet;

use crate::bundle::ClientCertificateBundle;
use crate::error::CredentialError;

const CLIENT_CERT_KEY: &str = "udap_clientCertificate";
const ANCHOR_SET_KEY: &str = "udap_anchorCertificates";
const SETTINGS_KEY: &str = "udap_sessionSettings";
const CONTAINER_SECRET_KEY: &str = "udap_containerSecret";

/// Serialized form of an anchor set: one base64 DER string per
/// certificate, intermediates in a sibling list.
#[derive(Debug, Serialize, Deserialize)]
struct AnchorSetDocument {
    roots: Vec<String>,
    #[serde(default)]
    intermediates: Vec<String>,
}

/// Typed layer over the chunked session store holding the active client
/// certificate bundle and the active anchor set.
///
/// Each logical value lives under a fixed key; all operations are scoped
/// by the caller's [`SessionContext`]. Certificate containers are
/// encrypted under a secret generated per session on first write, stored
/// beside the container — never a compile-time constant.
#[derive(Debug, Clone)]
pub struct CredentialSession<S> {
    store: ChunkedStore<S>,
}

impl<S: SessionStore> CredentialSession<S> {
    /// Creates a session layer over `backend` with default chunking.
    pub fn new(backend: S) -> Self {
        Self {
            store: ChunkedStore::new(backend),
        }
    }

    /// Creates a session layer over a pre-configured chunked store.
    pub fn with_store(store: ChunkedStore<S>) -> Self {
        Self { store }
    }

    /// The underlying chunked store.
    pub fn store(&self) -> &ChunkedStore<S> {
        &self.store
    }

    async fn container_secret(&self, ctx: &SessionContext) -> Result<String, CredentialError> {
        if let Some(bytes) = self.store.fetch(ctx, CONTAINER_SECRET_KEY).await? {
            return String::from_utf8(bytes)
                .map_err(|_| CredentialError::decode("container secret is not UTF-8"));
        }
        let mut raw = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut raw);
        let secret = hex::encode(raw);
        self.store
            .put(ctx, CONTAINER_SECRET_KEY, secret.as_bytes())
            .await?;
        Ok(secret)
    }

    /// Stores `bundle` as the session's active client certificate,
    /// replacing any previous one.
    pub async fn set_client_certificate(
        &self,
        ctx: &SessionContext,
        bundle: &ClientCertificateBundle,
    ) -> Result<(), CredentialError> {
        let secret = self.container_secret(ctx).await?;
        let container = bundle.to_encrypted_container(&secret)?;
        self.store.put(ctx, CLIENT_CERT_KEY, &container).await?;
        debug!(subject = bundle.subject(), "stored client certificate");
        Ok(())
    }

    /// Loads the session's active client certificate.
    ///
    /// Returns `Ok(None)` when no certificate is configured. A stored
    /// container that fails to decrypt or parse is an error, never a
    /// silent `None`.
    pub async fn client_certificate(
        &self,
        ctx: &SessionContext,
    ) -> Result<Option<ClientCertificateBundle>, CredentialError> {
        let Some(container) = self.store.fetch(ctx, CLIENT_CERT_KEY).await? else {
            return Ok(None);
        };
        let Some(secret_bytes) = self.store.fetch(ctx, CONTAINER_SECRET_KEY).await? else {
            return Err(CredentialError::decode(
                "client certificate present but container secret is missing",
            ));
        };
        let secret = String::from_utf8(secret_bytes)
            .map_err(|_| CredentialError::decode("container secret is not UTF-8"))?;
        ClientCertificateBundle::from_pkcs12(&container, &secret).map(Some)
    }

    /// Stores `set` as the session's active anchor set.
    pub async fn set_anchor_set(
        &self,
        ctx: &SessionContext,
        set: &AnchorCertificateSet,
    ) -> Result<(), CredentialError> {
        let doc = AnchorSetDocument {
            roots: set.roots().iter().map(|der| BASE64.encode(der)).collect(),
            intermediates: set
                .intermediates()
                .iter()
                .map(|der| BASE64.encode(der))
                .collect(),
        };
        let json = serde_json::to_vec(&doc)
            .map_err(|e| CredentialError::decode(format!("anchor list serialization: {e}")))?;
        self.store.put(ctx, ANCHOR_SET_KEY, &json).await?;
        debug!(roots = set.len(), "stored anchor set");
        Ok(())
    }

    /// Loads the session's active anchor set.
    ///
    /// An absent entry reads back as the empty set — callers fall back to
    /// default platform validation in that case.
    pub async fn anchor_set(
        &self,
        ctx: &SessionContext,
    ) -> Result<AnchorCertificateSet, CredentialError> {
        let Some(json) = self.store.fetch(ctx, ANCHOR_SET_KEY).await? else {
            return Ok(AnchorCertificateSet::new());
        };
        let doc: AnchorSetDocument = serde_json::from_slice(&json)
            .map_err(|e| CredentialError::decode(format!("anchor list deserialization: {e}")))?;

        let decode_list = |items: &[String]| -> Result<Vec<Vec<u8>>, CredentialError> {
            items
                .iter()
                .map(|b64| {
                    BASE64
                        .decode(b64.as_bytes())
                        .map_err(|e| CredentialError::decode(format!("anchor base64: {e}")))
                })
                .collect()
        };
        let roots = decode_list(&doc.roots)?;
        let intermediates = decode_list(&doc.intermediates)?;
        AnchorCertificateSet::from_der_lists(roots, intermediates)
            .map_err(|e| CredentialError::invalid_certificate(e.to_string()))
    }

    /// Stores the session's behavior settings.
    pub async fn set_settings(
        &self,
        ctx: &SessionContext,
        settings: SessionSettings,
    ) -> Result<(), CredentialError> {
        let json = serde_json::to_vec(&settings)
            .map_err(|e| CredentialError::decode(format!("settings serialization: {e}")))?;
        self.store.put(ctx, SETTINGS_KEY, &json).await?;
        Ok(())
    }

    /// Loads the session's behavior settings, defaulting when absent.
    pub async fn settings(&self, ctx: &SessionContext) -> Result<SessionSettings, CredentialError> {
        let Some(json) = self.store.fetch(ctx, SETTINGS_KEY).await? else {
            return Ok(SessionSettings::default());
        };
        serde_json::from_slice(&json)
            .map_err(|e| CredentialError::decode(format!("settings deserialization: {e}")))
    }

    /// Removes every value owned by the session: certificate, anchors,
    /// settings and container secret.
    pub async fn clear(&self, ctx: &SessionContext) -> Result<(), CredentialError> {
        for key in [
            CLIENT_CERT_KEY,
            ANCHOR_SET_KEY,
            SETTINGS_KEY,
            CONTAINER_SECRET_KEY,
        ] {
            self.store.delete(ctx, key).await?;
        }
        debug!(session = %ctx, "cleared credential session");
        Ok(())
    }
}
