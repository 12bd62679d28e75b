//! Kubernetes version discovery through the cluster API
//!
//! Reads the pod's service account credentials, fetches `/version` and
//! normalizes the answer to `major.minor`.

use crate::api::{ApiError, ApiFetcher, SecureApiClient};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Service account directory mounted into every pod
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Cluster version endpoint
pub const KUBE_VERSION_URL: &str = "https://kubernetes.default.svc/version";

const CA_CERT_FILE: &str = "ca.crt";
const TOKEN_FILE: &str = "token";

/// Errors raised while resolving the cluster version
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("missing service account directory: {path:?}")]
    MissingCredentialDirectory { path: PathBuf },

    #[error("failed to read {file:?}: {source}")]
    CredentialRead {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid version document: {0}")]
    VersionParse(#[from] serde_json::Error),
}

/// Service account token and CA certificate
#[derive(Clone)]
pub struct CredentialBundle {
    pub token: Vec<u8>,
    pub ca_certificate: Vec<u8>,
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("token", &"[REDACTED]")
            .field("ca_certificate", &format_args!("{} bytes", self.ca_certificate.len()))
            .finish()
    }
}

impl CredentialBundle {
    /// Read `ca.crt` and `token` from a service account directory
    pub fn read_from<P: AsRef<Path>>(dir: P) -> Result<Self, VersionError> {
        let dir = dir.as_ref();
        match fs::metadata(dir) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VersionError::MissingCredentialDirectory {
                    path: dir.to_path_buf(),
                });
            }
            // Anything other than not-found surfaces through the file reads
            Err(e) => tracing::debug!(path = %dir.display(), error = %e, "cannot stat service account directory"),
            Ok(_) => {}
        }

        let ca_certificate = read_file(&dir.join(CA_CERT_FILE))?;
        let token = read_file(&dir.join(TOKEN_FILE))?;

        Ok(Self {
            token,
            ca_certificate,
        })
    }

    /// Token as text; invalid UTF-8 is replaced rather than rejected
    pub fn token_str(&self) -> String {
        String::from_utf8_lossy(&self.token).into_owned()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, VersionError> {
    fs::read(path).map_err(|source| VersionError::CredentialRead {
        file: path.to_path_buf(),
        source,
    })
}

/// Response body of the `/version` endpoint
///
/// ```json
/// {
///   "major": "1",
///   "minor": "15",
///   "gitVersion": "v1.15.3",
///   "gitCommit": "2d3c76f9091b6bec110a5e63777c332469e0cba2",
///   "gitTreeState": "clean",
///   "buildDate": "2019-08-20T18:57:36Z",
///   "goVersion": "go1.12.9",
///   "compiler": "gc",
///   "platform": "linux/amd64"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionDocument {
    pub major: String,
    pub minor: String,
    pub git_version: String,
    pub git_commit: String,
    pub git_tree_state: String,
    pub build_date: String,
    pub go_version: String,
    pub compiler: String,
    pub platform: String,
}

impl VersionDocument {
    pub fn from_slice(body: &[u8]) -> Result<Self, VersionError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// `major.minor`, with `+` removed from the minor version ("15+" → "15")
    pub fn canonical(&self) -> String {
        let minor = self.minor.replace('+', "");
        format!("{}.{}", self.major, minor)
    }
}

/// Resolves the cluster version from service account credentials
#[derive(Debug, Clone)]
pub struct VersionResolver<F> {
    credential_dir: PathBuf,
    url: String,
    fetcher: F,
}

impl Default for VersionResolver<SecureApiClient> {
    fn default() -> Self {
        Self::new(SERVICE_ACCOUNT_DIR, KUBE_VERSION_URL, SecureApiClient::new())
    }
}

impl<F: ApiFetcher> VersionResolver<F> {
    pub fn new<P: Into<PathBuf>>(credential_dir: P, url: &str, fetcher: F) -> Self {
        Self {
            credential_dir: credential_dir.into(),
            url: url.to_string(),
            fetcher,
        }
    }

    /// Read credentials, fetch the version document and normalize it
    pub fn resolve(&self) -> Result<String, VersionError> {
        let credentials = CredentialBundle::read_from(&self.credential_dir)?;
        tracing::trace!(url = %self.url, "fetching version document");

        let body = self.fetcher.fetch(
            &self.url,
            &credentials.token_str(),
            &credentials.ca_certificate,
        )?;
        tracing::trace!(body = %String::from_utf8_lossy(&body), "version response");

        let document = VersionDocument::from_slice(&body)?;
        tracing::trace!(?document, "parsed version document");

        let version = document.canonical();
        tracing::info!(version = %version, "resolved kubernetes version");
        Ok(version)
    }
}

/// Resolve the running cluster's version through the in-cluster API
pub fn resolve_cluster_version() -> Result<String, VersionError> {
    VersionResolver::<SecureApiClient>::default().resolve()
}
