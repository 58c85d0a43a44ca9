use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber;

use stillcast::{
    auth::{Authenticator, ClientSecret, TokenStore},
    config::Config,
    pipeline::{Pipeline, UploadTarget},
    upload::VideoPublisher,
    video::VideoComposer,
};

#[derive(Parser)]
#[command(
    name = "stillcast",
    version,
    about = "Turn audio tracks and a cover image into videos and publish them",
    long_about = "stillcast scans a directory for audio tracks and one background image, composes a still-image video per track with FFmpeg, uploads each video, and deletes the local copy once the upload succeeds."
)]
struct Cli {
    /// Directory containing the audio tracks and the background image
    #[arg(short, long, default_value = ".")]
    directory: PathBuf,

    /// Directory composed videos are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OAuth client registration file
    #[arg(long)]
    client_secret: Option<PathBuf>,

    /// Token cache file
    #[arg(long)]
    token: Option<PathBuf>,

    /// Keep the image's native size instead of centering it on the fixed canvas
    #[arg(long)]
    native_size: bool,

    /// Compose videos only; skip uploads and keep every local file
    #[arg(long)]
    no_upload: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting stillcast v{}", env!("CARGO_PKG_VERSION"));
    info!("Media directory: {:?}", cli.directory);

    // Load configuration
    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => Config::default(),
    };

    // CLI flags override the file
    if let Some(output_dir) = cli.output_dir {
        config.video.output_dir = output_dir;
    }
    if cli.native_size {
        config.video.native_canvas = true;
    }
    if let Some(path) = cli.client_secret {
        config.auth.client_secret_path = path;
    }
    if let Some(path) = cli.token {
        config.auth.token_path = path;
    }
    config.validate()?;

    if !VideoComposer::check_ffmpeg_available() {
        anyhow::bail!("ffmpeg was not found on PATH. Install FFmpeg and try again.");
    }

    // Credential bootstrap happens before any composition so a fatal setup
    // problem surfaces without wasted encodes. The first run is interactive.
    let upload = if cli.no_upload {
        info!("Uploads disabled; composed videos will be kept locally");
        None
    } else {
        let secret = ClientSecret::from_file(&config.auth.client_secret_path)?;
        let store = TokenStore::new(config.auth.token_path.clone());
        let authenticator = Authenticator::new(secret, store, config.auth.callback_port)?;
        let token = authenticator.authorize().await?;
        let publisher = VideoPublisher::new(&config.upload)?;
        Some(UploadTarget { publisher, token })
    };

    let pipeline = Pipeline::new(config, upload);
    let report = pipeline.run(&cli.directory).await?;

    info!(
        "Done: {} composed, {} uploaded, {} kept, {} skipped",
        report.composed, report.uploaded, report.kept, report.skipped
    );
    Ok(())
}
