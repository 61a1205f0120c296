//! Service account credentials
//!
//! A key is taken from a JSON file when a path is configured, otherwise from
//! inline JSON. Keys pasted into environment variables usually carry escaped
//! newlines in `private_key`; those are restored before use.

use crate::error::{SheetsError, SheetsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where the key is read from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialSettings {
    /// Path to a service account key file
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Service account key JSON
    #[serde(default)]
    pub inline_json: Option<String>,
}

/// Resolved credential source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    File(PathBuf),
    Inline,
    None,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::File(_) => f.write_str("file"),
            CredentialSource::Inline => f.write_str("inline"),
            CredentialSource::None => f.write_str("none"),
        }
    }
}

/// Service account key fields used for token exchange
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Non-failing inspection of the configured credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialReport {
    pub source: CredentialSource,
    pub has_client_email: bool,
    pub has_private_key: bool,
    pub client_email: Option<String>,
}

#[derive(Deserialize)]
struct LooseKey {
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
}

impl CredentialSettings {
    pub fn source(&self) -> CredentialSource {
        if let Some(path) = &self.path {
            CredentialSource::File(resolve(path))
        } else if self.inline_json.is_some() {
            CredentialSource::Inline
        } else {
            CredentialSource::None
        }
    }

    fn raw_json(&self) -> SheetsResult<String> {
        match self.source() {
            CredentialSource::File(path) => {
                if !path.exists() {
                    return Err(SheetsError::CredentialsNotFound(path));
                }
                Ok(std::fs::read_to_string(&path)?)
            }
            CredentialSource::Inline => Ok(self.inline_json.clone().unwrap_or_default()),
            CredentialSource::None => Err(SheetsError::NoCredentials),
        }
    }

    /// Load and validate the service account key
    pub fn load(&self) -> SheetsResult<ServiceAccountKey> {
        let raw = self.raw_json()?;
        let loose: LooseKey = serde_json::from_str(&raw)?;

        let client_email = loose.client_email.filter(|v| !v.is_empty());
        let private_key = loose.private_key.filter(|v| !v.is_empty());
        let (Some(client_email), Some(private_key)) = (client_email, private_key) else {
            return Err(SheetsError::InvalidCredentials(
                "credentials JSON missing client_email or private_key. Ensure this is a \
                 Service Account key (Keys -> Add key -> JSON) and not an OAuth client or \
                 metadata file"
                    .to_string(),
            ));
        };

        let mut key: ServiceAccountKey = serde_json::from_str(&raw)?;
        key.client_email = client_email;
        key.private_key = normalize_private_key(&private_key);
        Ok(key)
    }

    /// Describe the configured credentials without failing
    pub fn report(&self) -> CredentialReport {
        let source = self.source();
        let loose = self
            .raw_json()
            .ok()
            .and_then(|raw| serde_json::from_str::<LooseKey>(&raw).ok());

        let client_email = loose
            .as_ref()
            .and_then(|k| k.client_email.clone())
            .filter(|v| !v.is_empty());
        let has_private_key = loose
            .as_ref()
            .and_then(|k| k.private_key.as_ref())
            .is_some_and(|v| !v.is_empty());

        CredentialReport {
            source,
            has_client_email: client_email.is_some(),
            has_private_key,
            client_email,
        }
    }
}

fn resolve(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Turn literal `\n` sequences into newlines and drop carriage returns
pub fn normalize_private_key(key: &str) -> String {
    key.replace("\\n", "\n").replace("\r\n", "\n")
}
