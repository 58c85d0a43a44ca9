use crate::config::VideoConfig;
use crate::error::ComposeError;

/// Visual frame the background image is drawn onto.
///
/// `Native` uses the image's own pixel size. `Fixed` centers the image at
/// native size over a black backdrop; the image is never scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canvas {
    Native,
    Fixed { width: u32, height: u32 },
}

impl Canvas {
    /// Derive the canvas policy from the video configuration
    pub fn from_config(config: &VideoConfig) -> Self {
        if config.native_canvas {
            Canvas::Native
        } else {
            Canvas::Fixed {
                width: config.canvas_width,
                height: config.canvas_height,
            }
        }
    }

    /// Offsets that center an image of the given size on this canvas.
    ///
    /// Returns `None` for the native canvas (nothing to center) and an
    /// error when the image overhangs the fixed canvas, since the image is
    /// never scaled down to fit.
    pub fn centering_offsets(
        &self,
        image_width: u32,
        image_height: u32,
    ) -> Result<Option<(u32, u32)>, ComposeError> {
        match *self {
            Canvas::Native => Ok(None),
            Canvas::Fixed { width, height } => {
                if image_width > width || image_height > height {
                    return Err(ComposeError::ImageLargerThanCanvas {
                        image_width,
                        image_height,
                        canvas_width: width,
                        canvas_height: height,
                    });
                }

                Ok(Some(((width - image_width) / 2, (height - image_height) / 2)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_canvas_centers_image() {
        let canvas = Canvas::Fixed { width: 1920, height: 1080 };

        let offsets = canvas.centering_offsets(800, 600).unwrap();
        assert_eq!(offsets, Some((560, 240)));
    }

    #[test]
    fn test_offsets_use_integer_halving() {
        let canvas = Canvas::Fixed { width: 1920, height: 1080 };

        // (1920 - 801) / 2 == 559 in integer math
        let offsets = canvas.centering_offsets(801, 601).unwrap();
        assert_eq!(offsets, Some((559, 239)));
    }

    #[test]
    fn test_exact_fit_has_zero_offsets() {
        let canvas = Canvas::Fixed { width: 1920, height: 1080 };

        let offsets = canvas.centering_offsets(1920, 1080).unwrap();
        assert_eq!(offsets, Some((0, 0)));
    }

    #[test]
    fn test_native_canvas_has_no_offsets() {
        let canvas = Canvas::Native;

        let offsets = canvas.centering_offsets(800, 600).unwrap();
        assert_eq!(offsets, None);
    }

    #[test]
    fn test_oversized_image_rejected() {
        let canvas = Canvas::Fixed { width: 1920, height: 1080 };

        let result = canvas.centering_offsets(2000, 600);
        assert!(matches!(result, Err(ComposeError::ImageLargerThanCanvas { .. })));

        let result = canvas.centering_offsets(800, 1200);
        assert!(matches!(result, Err(ComposeError::ImageLargerThanCanvas { .. })));
    }

    #[test]
    fn test_from_config() {
        let mut config = VideoConfig::default();
        assert_eq!(
            Canvas::from_config(&config),
            Canvas::Fixed { width: 1920, height: 1080 }
        );

        config.native_canvas = true;
        assert_eq!(Canvas::from_config(&config), Canvas::Native);
    }
}
