//! Authenticated HTTPS GET against the cluster API
//!
//! Requests carry the service account bearer token. The CA certificate is
//! loaded into the TLS configuration, but the server certificate is NOT
//! verified: `danger_accept_invalid_certs(true)` is set on every client.
//! Non-200 responses are errors and nothing is retried.

use base64::Engine;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;
use thiserror::Error;

const PEM_BEGIN: &str = "-----BEGIN ";
const PEM_DASHES: &str = "-----";

/// Errors raised by a single API request
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("unable to decode certificate: {reason}")]
    CertificateDecode { reason: String },

    #[error("unable to build HTTPS client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("URL:[{url}], StatusCode:[{status}]")]
    HttpStatus { url: String, status: u16 },
}

/// Fetches a URL with token + CA certificate credentials
pub trait ApiFetcher {
    /// GET `url` and return the response body of a 200 response
    fn fetch(&self, url: &str, token: &str, ca_cert_pem: &[u8]) -> Result<Vec<u8>, ApiError>;
}

/// Blocking HTTPS client for the cluster API
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureApiClient;

impl SecureApiClient {
    pub fn new() -> Self {
        Self
    }

    fn build_client(ca_cert_pem: &[u8]) -> Result<Client, ApiError> {
        let der = decode_pem_certificate(ca_cert_pem)?;
        tracing::trace!("Loading CA certificate");

        let mut roots = RootCertStore::empty();
        roots
            .add(CertificateDer::from(der.as_slice()))
            .map_err(|e| ApiError::CertificateDecode {
                reason: e.to_string(),
            })?;

        let certificate = reqwest::Certificate::from_der(&der).map_err(|e| {
            ApiError::CertificateDecode {
                reason: e.to_string(),
            }
        })?;

        Client::builder()
            .add_root_certificate(certificate)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|source| ApiError::ClientBuild { source })
    }
}

impl ApiFetcher for SecureApiClient {
    fn fetch(&self, url: &str, token: &str, ca_cert_pem: &[u8]) -> Result<Vec<u8>, ApiError> {
        tracing::trace!(url, "fetching");
        let client = Self::build_client(ca_cert_pem)?;

        let auth_token = format!("Bearer {}", token.trim());
        tracing::trace!(auth_token = %auth_token, "authorization header");

        let response = client
            .get(url)
            .header(AUTHORIZATION, auth_token)
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::trace!(url, status = status.as_u16(), headers = ?response.headers(), "unexpected status");
        }
        expect_ok(url, status)?;

        let body = response.bytes().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(body.to_vec())
    }
}

fn expect_ok(url: &str, status: StatusCode) -> Result<(), ApiError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(ApiError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

/// Decode the first well-formed PEM block in `raw` into DER bytes
///
/// A block without a matching END line or with an invalid body is skipped
/// and the search resumes after its BEGIN line.
pub fn decode_pem_certificate(raw: &[u8]) -> Result<Vec<u8>, ApiError> {
    let text = std::str::from_utf8(raw).map_err(|_| ApiError::CertificateDecode {
        reason: "PEM data is not UTF-8".to_string(),
    })?;

    let mut rest = text;
    let mut reason = "no PEM block found".to_string();
    while let Some(begin) = rest.find(PEM_BEGIN) {
        rest = &rest[begin + PEM_BEGIN.len()..];
        match decode_pem_block(rest) {
            Ok(der) => return Ok(der),
            Err(skipped) => {
                tracing::trace!(reason = %skipped, "skipping PEM block");
                reason = skipped;
            }
        }
    }

    Err(ApiError::CertificateDecode { reason })
}

/// Decode one block; `block` starts right after `-----BEGIN `
fn decode_pem_block(block: &str) -> Result<Vec<u8>, String> {
    let label_end = block
        .find(PEM_DASHES)
        .ok_or_else(|| "unterminated BEGIN line".to_string())?;
    let label = &block[..label_end];
    if label.contains('\n') {
        return Err("unterminated BEGIN line".to_string());
    }

    let body_and_rest = &block[label_end + PEM_DASHES.len()..];
    let end_marker = format!("-----END {label}-----");
    let body_end = body_and_rest
        .find(&end_marker)
        .ok_or_else(|| format!("missing END line for {label}"))?;

    let body: String = body_and_rest[..body_end]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if body.is_empty() {
        return Err(format!("empty {label} block"));
    }

    base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| format!("invalid {label} body: {e}"))
}
