use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::auth::StoredToken;
use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::scanner::{MediaScanner, MediaSet};
use crate::upload::VideoPublisher;
use crate::video::{ComposedVideo, VideoComposer};

/// Summary of one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Audio tracks found by the scanner
    pub tracks: usize,

    /// Videos successfully composed
    pub composed: usize,

    /// Videos uploaded and deleted locally
    pub uploaded: usize,

    /// Composed videos kept on disk (failed upload, or uploads disabled)
    pub kept: usize,

    /// Tracks skipped because composition failed
    pub skipped: usize,
}

/// Upload destination: the publisher plus the credential it authorizes with
pub struct UploadTarget {
    pub publisher: VideoPublisher,
    pub token: StoredToken,
}

/// What happened to one composed video after the upload attempt
enum UploadOutcome {
    Uploaded,
    Kept,
}

/// Orchestrates the per-track loop
///
/// The pipeline is deliberately sequential:
/// 1. Scan - classify the media directory, abort if inputs are missing
/// 2. Compose - one still-image video per track; failures skip the track
/// 3. Upload - push the video; success deletes the local file, failure
///    keeps it for a future manual run
///
/// Per-track failures never abort the run. Re-running against the same
/// directory recomposes (and re-uploads) every track still present; there
/// is no ledger of past runs.
pub struct Pipeline {
    config: Config,
    scanner: MediaScanner,
    composer: VideoComposer,
    upload: Option<UploadTarget>,
}

impl Pipeline {
    /// Create a pipeline. `upload: None` disables uploads; every composed
    /// video is then kept locally.
    pub fn new(config: Config, upload: Option<UploadTarget>) -> Self {
        let scanner = MediaScanner::new(&config.scan);
        let composer = VideoComposer::new(&config.video);
        Self {
            config,
            scanner,
            composer,
            upload,
        }
    }

    /// Run the full loop over one media directory.
    pub async fn run<P: AsRef<Path>>(&self, directory: P) -> Result<RunReport> {
        let directory = directory.as_ref();

        info!("🎬 Scanning media directory {:?}", directory);
        let media = self.scanner.scan(directory)?;
        let background = self.require_inputs(&media, directory)?;

        info!("   Tracks found: {}", media.tracks.len());
        info!("   Background image: {:?}", background);

        let output_dir = &self.config.video.output_dir;
        let mut report = RunReport {
            tracks: media.tracks.len(),
            ..Default::default()
        };

        for track in &media.tracks {
            info!("🎵 Composing video for {:?}", track);

            let video = match self.composer.compose(background, track, output_dir).await {
                Ok(video) => video,
                Err(e) => {
                    warn!("Skipping {:?}: {}", track, e);
                    report.skipped += 1;
                    continue;
                }
            };

            report.composed += 1;
            info!(
                "   Wrote {:?} ({:.1}s, {:.1} MB)",
                video.path,
                video.duration,
                video.file_size as f64 / 1024.0 / 1024.0
            );

            match &self.upload {
                Some(target) => match self.upload_and_finalize(target, &video).await {
                    UploadOutcome::Uploaded => report.uploaded += 1,
                    UploadOutcome::Kept => report.kept += 1,
                },
                None => {
                    info!("   Uploads disabled; keeping {:?}", video.path);
                    report.kept += 1;
                }
            }
        }

        info!(
            "🎉 Run complete: {} track(s), {} composed, {} uploaded, {} kept, {} skipped",
            report.tracks, report.composed, report.uploaded, report.kept, report.skipped
        );

        Ok(report)
    }

    /// Enforce the input invariant: one background image and at least one
    /// audio track, or the whole run aborts.
    fn require_inputs<'a>(&self, media: &'a MediaSet, directory: &Path) -> Result<&'a PathBuf> {
        let background =
            media
                .background
                .as_ref()
                .ok_or_else(|| ScanError::NoBackgroundImage {
                    path: directory.display().to_string(),
                })?;

        if media.tracks.is_empty() {
            return Err(ScanError::NoAudioTracks {
                path: directory.display().to_string(),
            }
            .into());
        }

        Ok(background)
    }

    /// Upload one composed video and apply the local-file policy: delete on
    /// success (deletion failure is logged, not fatal), keep on failure.
    async fn upload_and_finalize(
        &self,
        target: &UploadTarget,
        video: &ComposedVideo,
    ) -> UploadOutcome {
        match target
            .publisher
            .upload(&target.token, &video.path, &video.title)
            .await
        {
            Ok(video_id) => {
                info!("   Uploaded {:?} as video {}", video.path, video_id);
                if let Err(e) = std::fs::remove_file(&video.path) {
                    warn!("   Could not delete {:?} after upload: {}", video.path, e);
                }
                UploadOutcome::Uploaded
            }
            Err(e) => {
                warn!(
                    "   Upload failed for {:?}: {}; keeping local file",
                    video.path, e
                );
                UploadOutcome::Kept
            }
        }
    }
}
