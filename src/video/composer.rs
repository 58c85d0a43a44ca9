use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tokio::task;
use tracing::{debug, info};

use crate::audio::AudioProbe;
use crate::config::VideoConfig;
use crate::error::{ComposeError, Result};
use crate::video::canvas::Canvas;

/// A finished composed video
#[derive(Debug, Clone)]
pub struct ComposedVideo {
    /// Path of the written file
    pub path: PathBuf,

    /// Title derived from the audio file's base name
    pub title: String,

    /// Duration in seconds, copied from the audio track
    pub duration: f64,

    /// File size in bytes
    pub file_size: u64,
}

/// Composes still-image videos through external FFmpeg commands
pub struct VideoComposer {
    fps: u32,
    canvas: Canvas,
    video_codec: String,
    audio_codec: String,
}

impl VideoComposer {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            fps: config.fps,
            canvas: Canvas::from_config(config),
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
        }
    }

    pub fn check_ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Output path for a track: the audio base name with an `.mp4` extension,
    /// inside the output directory.
    pub fn output_path(output_dir: &Path, audio_path: &Path) -> PathBuf {
        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("track");
        output_dir.join(format!("{}.mp4", stem))
    }

    /// Title for a track: the audio file's base name without extension.
    pub fn title_for(audio_path: &Path) -> String {
        audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("track")
            .to_string()
    }

    /// Compose a video from one image and one audio track.
    ///
    /// The image is held static for the full audio duration; on the fixed
    /// canvas it is centered over a black backdrop at native size.
    pub async fn compose(
        &self,
        image_path: &Path,
        audio_path: &Path,
        output_dir: &Path,
    ) -> Result<ComposedVideo> {
        if !Self::check_ffmpeg_available() {
            return Err(ComposeError::FfmpegMissing.into());
        }

        let track = AudioProbe::probe(audio_path)?;
        info!(
            "   Audio: {:.1}s, {} Hz, {} channel(s)",
            track.duration, track.sample_rate, track.channels
        );

        let (image_width, image_height) =
            image::image_dimensions(image_path).map_err(|e| ComposeError::ImageUnreadable {
                path: image_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let offsets = self.canvas.centering_offsets(image_width, image_height)?;
        if let Some((x, y)) = offsets {
            debug!(
                "Centering {}x{} image at offset ({}, {})",
                image_width, image_height, x, y
            );
        }

        create_dir_all(output_dir)?;
        let output_path = Self::output_path(output_dir, audio_path);

        let args = self.build_args(image_path, audio_path, offsets, &output_path);
        debug!("ffmpeg {}", args.join(" "));

        let mut cmd = Command::new("ffmpeg");
        cmd.args(&args);

        let output = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| ComposeError::SpawnFailed {
                reason: format!("Failed to spawn FFmpeg process: {}", e),
            })?
            .map_err(|e| ComposeError::SpawnFailed {
                reason: format!("FFmpeg execution failed: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ComposeError::EncodeFailed {
                stderr: stderr.trim_end().to_string(),
            }
            .into());
        }

        let file_size = std::fs::metadata(&output_path)?.len();

        Ok(ComposedVideo {
            path: output_path,
            title: Self::title_for(audio_path),
            duration: track.duration,
            file_size,
        })
    }

    /// Build the full FFmpeg argument list for one composition.
    ///
    /// `-loop 1` repeats the single image; `-shortest` ends the video
    /// exactly where the audio ends, so the output duration equals the
    /// audio duration.
    fn build_args(
        &self,
        image_path: &Path,
        audio_path: &Path,
        offsets: Option<(u32, u32)>,
        output_path: &Path,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-loop".into(),
            "1".into(),
            "-framerate".into(),
            self.fps.to_string(),
            "-i".into(),
            image_path.display().to_string(),
            "-i".into(),
            audio_path.display().to_string(),
        ];

        if let (Canvas::Fixed { width, height }, Some((x, y))) = (self.canvas, offsets) {
            args.push("-vf".into());
            args.push(format!("pad={}:{}:{}:{}:black", width, height, x, y));
        }

        args.extend([
            "-c:v".into(),
            self.video_codec.clone(),
            "-tune".into(),
            "stillimage".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:a".into(),
            self.audio_codec.clone(),
            "-b:a".into(),
            "192k".into(),
            "-shortest".into(),
            output_path.display().to_string(),
        ]);

        args
    }
}
