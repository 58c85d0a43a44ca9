//! # stillcast
//!
//! Turn a folder of audio tracks and one cover image into videos and
//! publish them to YouTube.
//!
//! stillcast scans a media directory, composes one still-image video per
//! audio track by driving an external FFmpeg process, uploads each video
//! over the resumable upload API, and deletes the local copy once the
//! upload succeeds. A failed upload keeps the file for a future manual run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use stillcast::{config::Config, pipeline::Pipeline};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//!
//! // No upload target: compose only, keep every video locally.
//! let pipeline = Pipeline::new(config, None);
//! let report = pipeline.run(Path::new("music/")).await?;
//!
//! println!("{} videos composed", report.composed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`scanner`] - Media directory scan and classification
//! - [`audio`] - Track duration probing
//! - [`video`] - Canvas layout and FFmpeg-driven composition
//! - [`auth`] - Credential acquisition and persistence
//! - [`upload`] - Resumable upload client
//! - [`pipeline`] - The sequential per-track loop
//!
//! ## First run
//!
//! Uploading requires a one-time interactive bootstrap: place the OAuth
//! client registration next to the binary as `client_secret.json`, run
//! stillcast, open the printed consent URL in a browser, and grant access.
//! The resulting token lands in `token.json` and later runs refresh it
//! silently.

pub mod audio;
pub mod auth;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod scanner;
pub mod upload;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, StillcastError},
    pipeline::{Pipeline, RunReport, UploadTarget},
    scanner::{MediaScanner, MediaSet},
    upload::VideoPublisher,
    video::VideoComposer,
};
