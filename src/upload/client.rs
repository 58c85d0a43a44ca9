use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::StoredToken;
use crate::config::UploadConfig;
use crate::error::UploadError;

/// Default resumable upload endpoint.
pub const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

/// Connection timeout (10 seconds). No overall request timeout: the PUT
/// carrying the video body legitimately runs for minutes.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Metadata carried by the session-opening request.
#[derive(Debug, Serialize)]
struct UploadRequest {
    snippet: Snippet,
    status: UploadStatus,
}

#[derive(Debug, Serialize)]
struct Snippet {
    title: String,
    #[serde(rename = "categoryId")]
    category_id: String,
}

#[derive(Debug, Serialize)]
struct UploadStatus {
    #[serde(rename = "privacyStatus")]
    privacy_status: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Client for the resumable video upload endpoint
pub struct VideoPublisher {
    http: reqwest::Client,
    upload_url: String,
    category_id: String,
    privacy: String,
}

impl VideoPublisher {
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        Self::with_upload_url(config, UPLOAD_URL.to_string())
    }

    /// Create a publisher against a custom endpoint.
    ///
    /// Useful for testing against a mock server.
    pub fn with_upload_url(config: &UploadConfig, upload_url: String) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            upload_url,
            category_id: config.category_id.clone(),
            privacy: config.privacy.clone(),
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Upload a video file with the fixed metadata defaults.
    ///
    /// Opens the resumable session, then streams the file to the session
    /// URL. Returns the remote-assigned video id.
    pub async fn upload(
        &self,
        token: &StoredToken,
        video_path: &Path,
        title: &str,
    ) -> Result<String, UploadError> {
        let file_size = tokio::fs::metadata(video_path).await?.len();

        let session_url = self.open_session(token, title, file_size).await?;
        debug!("Upload session opened for {:?}", video_path);

        let video_id = self
            .send_file(token, &session_url, video_path, file_size)
            .await?;

        info!("Upload complete: video id {}", video_id);
        Ok(video_id)
    }

    /// Open a resumable upload session; returns the session URL.
    async fn open_session(
        &self,
        token: &StoredToken,
        title: &str,
        file_size: u64,
    ) -> Result<String, UploadError> {
        let metadata = UploadRequest {
            snippet: Snippet {
                title: title.to_string(),
                category_id: self.category_id.clone(),
            },
            status: UploadStatus {
                privacy_status: self.privacy.clone(),
            },
        };

        let response = self
            .http
            .post(&self.upload_url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&token.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", file_size.to_string())
            .json(&metadata)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(UploadError::Rejected { status, body });
        }

        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(UploadError::MissingSessionUrl)
    }

    /// Stream the file bytes to the session URL.
    async fn send_file(
        &self,
        token: &StoredToken,
        session_url: &str,
        video_path: &Path,
        file_size: u64,
    ) -> Result<String, UploadError> {
        let file = tokio::fs::File::open(video_path).await?;

        let response = self
            .http
            .put(session_url)
            .bearer_auth(&token.access_token)
            .header(reqwest::header::CONTENT_TYPE, "video/mp4")
            .header(reqwest::header::CONTENT_LENGTH, file_size.to_string())
            .body(reqwest::Body::from(file))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(UploadError::Rejected { status, body });
        }

        let parsed: UploadResponse = response.json().await?;
        parsed.id.ok_or(UploadError::MissingVideoId)
    }
}
