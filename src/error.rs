use thiserror::Error;

/// Main error type for the stillcast library
#[derive(Error, Debug)]
pub enum StillcastError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Composition error: {0}")]
    Compose(#[from] ComposeError),

    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Media directory scan errors
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Media directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No audio tracks found in directory: {path}")]
    NoAudioTracks { path: String },

    #[error("No background image found in directory: {path}")]
    NoBackgroundImage { path: String },
}

/// Audio probing errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio file: {path}")]
    OpenFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Could not determine duration of {path}: {reason}")]
    DurationUnknown { path: String, reason: String },
}

/// Video composition errors
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("ffmpeg not found on PATH. Please install FFmpeg.")]
    FfmpegMissing,

    #[error("Failed to read image {path}: {reason}")]
    ImageUnreadable { path: String, reason: String },

    #[error("Image {image_width}x{image_height} does not fit the {canvas_width}x{canvas_height} canvas")]
    ImageLargerThanCanvas {
        image_width: u32,
        image_height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("Failed to run ffmpeg: {reason}")]
    SpawnFailed { reason: String },

    #[error("ffmpeg failed: {stderr}")]
    EncodeFailed { stderr: String },
}

/// Credential acquisition errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Client secret file not found: {path}")]
    ClientSecretMissing { path: String },

    #[error("Failed to parse client secret file {path}: {reason}")]
    ClientSecretInvalid { path: String, reason: String },

    #[error("Invalid endpoint URI {uri}: {reason}")]
    InvalidEndpoint { uri: String, reason: String },

    #[error("Token endpoint rejected the request with status {status}: {body}")]
    TokenRejected { status: u16, body: String },

    #[error("Failed to persist token to {path}: {reason}")]
    TokenPersistFailed { path: String, reason: String },

    #[error("Authorization was denied: {reason}")]
    ConsentDenied { reason: String },

    #[error("Authorization callback failed: {reason}")]
    CallbackFailed { reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Upload session did not return a session URL")]
    MissingSessionUrl,

    #[error("Upload response did not contain a video id")]
    MissingVideoId,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using StillcastError
pub type Result<T> = std::result::Result<T, StillcastError>;

impl StillcastError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is isolated to a single track (the run continues)
    /// or fatal to the whole run.
    pub fn is_per_track(&self) -> bool {
        matches!(
            self,
            Self::Audio(_) | Self::Compose(_) | Self::Upload(_)
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Scan(ScanError::NoAudioTracks { path }) => {
                format!("No audio tracks found in '{}'. Nothing to do.", path)
            }
            Self::Scan(ScanError::NoBackgroundImage { path }) => {
                format!("No background image found in '{}'. Add a .jpg or .png cover.", path)
            }
            Self::Compose(ComposeError::FfmpegMissing) => {
                "ffmpeg was not found on PATH. Install FFmpeg and try again.".to_string()
            }
            Self::Auth(AuthError::ClientSecretMissing { path }) => {
                format!("Client secret file '{}' not found. Download it from the API console.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
