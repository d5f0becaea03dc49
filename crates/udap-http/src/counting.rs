//! Byte-counting decompression of response bodies.

use bytes::Bytes;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use std::io::Read;
use tracing::debug;

use crate::error::PipelineError;

/// Read decorator that counts the bytes flowing through it.
///
/// Wraps the raw (still compressed) body before it reaches a decoder, so
/// the wire size can be reported even though the caller only ever sees
/// decompressed content. Purely observational: content is never altered.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R> CountingReader<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    /// Bytes observed so far.
    pub fn bytes_read(&self) -> u64 {
        self.count
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Recognized response content encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEncoding {
    /// No encoding (or an explicit `identity`).
    Identity,
    /// RFC 1952 gzip.
    Gzip,
    /// RFC 1950 zlib (the HTTP `deflate` coding).
    Deflate,
    /// An encoding this pipeline does not decode; bodies pass through.
    Other(String),
}

impl ContentEncoding {
    pub(crate) fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "identity" => Self::Identity,
            "gzip" | "x-gzip" => Self::Gzip,
            "deflate" => Self::Deflate,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Request-scoped transfer accounting, recorded per response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDiagnostics {
    /// The encoding the body arrived with.
    pub encoding: ContentEncoding,
    /// Bytes on the wire (after transfer decoding, before content
    /// decoding).
    pub compressed_bytes: u64,
    /// Bytes handed to the caller.
    pub decompressed_bytes: u64,
}

impl TransferDiagnostics {
    pub(crate) fn passthrough(encoding: ContentEncoding, len: u64) -> Self {
        Self {
            encoding,
            compressed_bytes: len,
            decompressed_bytes: len,
        }
    }
}

fn read_all<R: Read>(decoder: &mut R) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Decodes `raw` according to the declared `Content-Encoding`.
///
/// Unrecognized or absent encodings pass the body through unchanged; a
/// declared encoding that fails to decode is an error, not a silent
/// passthrough. "deflate" is decoded as a zlib stream per RFC 9110, with
/// a raw-deflate retry for servers that omit the zlib wrapper.
pub(crate) fn decode_body(
    declared: &str,
    raw: Bytes,
) -> Result<(Bytes, TransferDiagnostics), PipelineError> {
    let encoding = ContentEncoding::parse(declared);
    let wire_len = raw.len() as u64;

    let (decoded, consumed) = match &encoding {
        ContentEncoding::Identity | ContentEncoding::Other(_) => {
            if let ContentEncoding::Other(name) = &encoding {
                debug!(encoding = %name, "passing through unrecognized content encoding");
            }
            let diagnostics = TransferDiagnostics::passthrough(encoding, wire_len);
            return Ok((raw, diagnostics));
        }
        ContentEncoding::Gzip => {
            let mut decoder = GzDecoder::new(CountingReader::new(raw.as_ref()));
            let out = read_all(&mut decoder)
                .map_err(|e| PipelineError::decompress("gzip", e.to_string()))?;
            (out, decoder.into_inner().bytes_read())
        }
        ContentEncoding::Deflate => {
            let mut decoder = ZlibDecoder::new(CountingReader::new(raw.as_ref()));
            match read_all(&mut decoder) {
                Ok(out) => (out, decoder.into_inner().bytes_read()),
                Err(_) => {
                    // Some servers send raw deflate without the zlib wrapper.
                    let mut decoder = DeflateDecoder::new(CountingReader::new(raw.as_ref()));
                    let out = read_all(&mut decoder)
                        .map_err(|e| PipelineError::decompress("deflate", e.to_string()))?;
                    (out, decoder.into_inner().bytes_read())
                }
            }
        }
    };

    let diagnostics = TransferDiagnostics {
        encoding,
        compressed_bytes: consumed,
        decompressed_bytes: decoded.len() as u64,
    };
    debug!(
        compressed = diagnostics.compressed_bytes,
        decompressed = diagnostics.decompressed_bytes,
        "decoded response body"
    );
    Ok((Bytes::from(decoded), diagnostics))
}
