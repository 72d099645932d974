//! Lookup of the login material used by the authenticated session adapter.
//!
//! Writing these files is handled elsewhere; this module only reads them.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed credentials file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Login material for an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionAuth {
    Credentials { email: String, password: String },
    /// Path to a previously exported session cookie file.
    CookieFile(PathBuf),
}

impl std::fmt::Debug for SessionAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credentials { email, .. } => f
                .debug_struct("Credentials")
                .field("email", email)
                .field("password", &"[redacted]")
                .finish(),
            Self::CookieFile(path) => f.debug_tuple("CookieFile").field(path).finish(),
        }
    }
}

pub trait CredentialStore: Send + Sync {
    /// Returns the preferred login material, or `None` when nothing is
    /// configured. A credential pair wins over a cookie file.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if a configured file cannot be read.
    fn lookup(&self) -> Result<Option<SessionAuth>, CredentialError>;

    /// Cheap check used to decide whether the authenticated adapter should
    /// be attempted at all.
    fn has_auth(&self) -> bool;
}

#[derive(Deserialize)]
struct CredentialFile {
    email: String,
    password: String,
}

/// Reads a JSON `{"email", "password"}` file and a cookie export from disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    credentials_path: PathBuf,
    cookies_path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(credentials_path: impl Into<PathBuf>, cookies_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            cookies_path: cookies_path.into(),
        }
    }

    fn read_credentials(path: &Path) -> Result<Option<SessionAuth>, CredentialError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: CredentialFile =
            serde_json::from_str(&raw).map_err(|source| CredentialError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        if parsed.email.trim().is_empty() || parsed.password.is_empty() {
            tracing::warn!(
                path = %path.display(),
                "credentials file has an empty email or password; ignoring it"
            );
            return Ok(None);
        }
        Ok(Some(SessionAuth::Credentials {
            email: parsed.email,
            password: parsed.password,
        }))
    }
}

impl CredentialStore for FileCredentialStore {
    fn lookup(&self) -> Result<Option<SessionAuth>, CredentialError> {
        if self.credentials_path.is_file() {
            match Self::read_credentials(&self.credentials_path) {
                Ok(Some(auth)) => return Ok(Some(auth)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable credentials file");
                    return Err(e);
                }
            }
        }
        if self.cookies_path.is_file() {
            return Ok(Some(SessionAuth::CookieFile(self.cookies_path.clone())));
        }
        Ok(None)
    }

    fn has_auth(&self) -> bool {
        self.credentials_path.is_file() || self.cookies_path.is_file()
    }
}
