use std::path::Path;

use serde::Deserialize;

use crate::error::AuthError;

/// OAuth client registration in Google's "installed app" layout.
///
/// This is the `client_secret.json` downloaded from the API console; it
/// identifies the application, not the user.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub installed: InstalledApp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecret {
    /// Load the registration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AuthError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|_| AuthError::ClientSecretMissing {
            path: path.display().to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| AuthError::ClientSecretInvalid {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
