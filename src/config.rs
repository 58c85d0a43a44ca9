use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for stillcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Media directory scan settings
    pub scan: ScanConfig,

    /// Video composition settings
    pub video: VideoConfig,

    /// Credential handling settings
    pub auth: AuthConfig,

    /// Upload metadata settings
    pub upload: UploadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            video: VideoConfig::default(),
            auth: AuthConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string(),
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.scan.validate()?;
        self.video.validate()?;
        self.upload.validate()?;
        Ok(())
    }
}

/// Media directory scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Extensions classified as audio tracks (lowercase, without dot)
    pub audio_extensions: Vec<String>,

    /// Extensions classified as background images (lowercase, without dot)
    pub image_extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            audio_extensions: vec!["mp3".into(), "wav".into(), "flac".into()],
            image_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
        }
    }
}

impl ScanConfig {
    fn validate(&self) -> Result<()> {
        if self.audio_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "scan.audio_extensions".to_string(),
                value: "[]".to_string(),
            }
            .into());
        }

        if self.image_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "scan.image_extensions".to_string(),
                value: "[]".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Video composition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Output frame rate
    pub fps: u32,

    /// Canvas width when composing onto the fixed canvas
    pub canvas_width: u32,

    /// Canvas height when composing onto the fixed canvas
    pub canvas_height: u32,

    /// Use the image's native size as the canvas instead of the fixed one
    pub native_canvas: bool,

    /// Video codec passed to ffmpeg
    pub video_codec: String,

    /// Audio codec passed to ffmpeg
    pub audio_codec: String,

    /// Directory where composed videos are written
    pub output_dir: PathBuf,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: 24,
            canvas_width: 1920,
            canvas_height: 1080,
            native_canvas: false,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            output_dir: PathBuf::from("videos"),
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.fps".to_string(),
                value: self.fps.to_string(),
            }
            .into());
        }

        // yuv420p output requires even dimensions
        if self.canvas_width == 0 || self.canvas_width % 2 != 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.canvas_width".to_string(),
                value: self.canvas_width.to_string(),
            }
            .into());
        }

        if self.canvas_height == 0 || self.canvas_height % 2 != 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.canvas_height".to_string(),
                value: self.canvas_height.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Credential handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Path to the OAuth client registration (Google "installed app" JSON)
    pub client_secret_path: PathBuf,

    /// Path of the persisted token file
    pub token_path: PathBuf,

    /// Local port the authorization redirect listener binds to
    pub callback_port: u16,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_secret_path: PathBuf::from("client_secret.json"),
            token_path: PathBuf::from("token.json"),
            callback_port: 8080,
        }
    }
}

/// Upload metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Platform category code attached to every upload
    pub category_id: String,

    /// Visibility of uploaded videos
    pub privacy: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            category_id: "10".to_string(), // Music
            privacy: "private".to_string(),
        }
    }
}

impl UploadConfig {
    fn validate(&self) -> Result<()> {
        if !matches!(self.privacy.as_str(), "private" | "public" | "unlisted") {
            return Err(ConfigError::InvalidValue {
                key: "upload.privacy".to_string(),
                value: self.privacy.clone(),
            }
            .into());
        }

        if self.category_id.is_empty() || !self.category_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue {
                key: "upload.category_id".to_string(),
                value: self.category_id.clone(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let original_config = Config::default();

        // Save and load
        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.video.fps, loaded_config.video.fps);
        assert_eq!(original_config.upload.category_id, loaded_config.upload.category_id);
        assert_eq!(original_config.auth.callback_port, loaded_config.auth.callback_port);
        assert_eq!(original_config.scan.audio_extensions, loaded_config.scan.audio_extensions);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::from_file("/nonexistent/stillcast.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_fps() {
        let mut config = Config::default();
        config.video.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_odd_canvas_rejected() {
        let mut config = Config::default();
        config.video.canvas_width = 1919;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_privacy() {
        let mut config = Config::default();
        config.upload.privacy = "friends-only".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_audio_extensions_rejected() {
        let mut config = Config::default();
        config.scan.audio_extensions.clear();
        assert!(config.validate().is_err());
    }
}
