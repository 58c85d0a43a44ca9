use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{AudioError, Result};

/// Basic facts about an audio track
#[derive(Debug, Clone)]
pub struct TrackInfo {
    /// Path the track was probed from
    pub path: PathBuf,

    /// Duration in seconds
    pub duration: f64,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count
    pub channels: usize,
}

/// Probes audio files for duration without decoding samples
pub struct AudioProbe;

impl AudioProbe {
    /// Probe an audio file and return its duration and stream parameters.
    ///
    /// Duration comes from the container's frame count when the demuxer
    /// reports one; otherwise the packets are walked and their durations
    /// summed. No samples are decoded either way.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<TrackInfo> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|_| AudioError::OpenFailed {
            path: path.display().to_string(),
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a probe hint using the file extension
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|_| AudioError::UnsupportedFormat {
                format: path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?;

        let mut format = probed.format;

        // Find the first audio track with a known (decodable) codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::OpenFailed {
                path: path.display().to_string(),
            })?;

        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params.sample_rate.ok_or_else(|| AudioError::DurationUnknown {
            path: path.display().to_string(),
            reason: "no sample rate in stream parameters".to_string(),
        })?;

        let channels = params.channels.map(|c| c.count()).unwrap_or(1);

        let time_base = params.time_base.ok_or_else(|| AudioError::DurationUnknown {
            path: path.display().to_string(),
            reason: "no time base in stream parameters".to_string(),
        })?;

        let duration = if let Some(n_frames) = params.n_frames {
            let time = time_base.calc_time(n_frames);
            time.seconds as f64 + time.frac
        } else {
            // Containers like raw MP3 streams may not carry a frame count;
            // walk the packets and sum their durations instead.
            debug!("No frame count for {:?}; walking packets", path);

            let mut total: u64 = 0;
            loop {
                match format.next_packet() {
                    Ok(packet) => {
                        if packet.track_id() == track_id {
                            total += packet.dur;
                        }
                    }
                    Err(SymphoniaError::IoError(_)) => break, // End of stream
                    Err(_) => break,
                }
            }

            let time = time_base.calc_time(total);
            time.seconds as f64 + time.frac
        };

        if duration <= 0.0 {
            return Err(AudioError::DurationUnknown {
                path: path.display().to_string(),
                reason: "stream contains no audible frames".to_string(),
            }
            .into());
        }

        Ok(TrackInfo {
            path: path.to_path_buf(),
            duration,
            sample_rate,
            channels,
        })
    }
}
