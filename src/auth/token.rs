use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AuthError;

/// Margin subtracted from the expiry time so a token is never presented to
/// the API moments before it lapses.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Persisted access/refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    pub expires_at: DateTime<Utc>,

    pub token_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl StoredToken {
    /// Whether the access token has lapsed (with a safety margin)
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }

    /// Whether a silent refresh is possible
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Reads and writes the token file.
///
/// A missing or unparseable file is treated as "no token": the caller falls
/// back to the interactive flow and the next save overwrites the file.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted token, if a usable one exists
    pub fn load(&self) -> Option<StoredToken> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => {
                debug!("No token file at {:?}", self.path);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Discarding corrupt token file {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Persist a token, overwriting any prior file
    pub fn save(&self, token: &StoredToken) -> Result<(), AuthError> {
        let content =
            serde_json::to_string_pretty(token).map_err(|e| AuthError::TokenPersistFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        std::fs::write(&self.path, content).map_err(|e| AuthError::TokenPersistFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!("Token persisted to {:?}", self.path);
        Ok(())
    }
}
