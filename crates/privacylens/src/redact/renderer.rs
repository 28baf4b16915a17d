//! Destructive blur rendering for redacted regions.
//!
//! The renderer is stateless given a frame and a region: it clamps the
//! bounding box to the frame, replaces the region's pixels with a strong
//! Gaussian blur, and optionally overlays a diagnostic label. The kernel
//! is large by default so the blur is not recoverable by sharpening.

use std::fmt;
use std::fs;

use ab_glyph::{FontVec, PxScale};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::filter::separable_filter_equal;
use imageproc::rect::Rect;

use crate::config::{BlurConfig, OverlayConfig};
use crate::error::{Error, Result};
use crate::frame::{BoundingBox, Detection, PixelRect};

/// Color used for diagnostic overlays.
const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Label text height in pixels.
const OVERLAY_TEXT_SCALE: f32 = 16.0;

/// Applies the blur transform (and optional diagnostics) to frame regions.
pub struct Renderer {
    kernel: Vec<f32>,
    overlay_enabled: bool,
    font: Option<FontVec>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("kernel_size", &self.kernel.len())
            .field("overlay_enabled", &self.overlay_enabled)
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl Renderer {
    /// Create a renderer from blur and overlay configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the blur parameters are invalid or a configured
    /// overlay font cannot be loaded.
    pub fn new(blur: &BlurConfig, overlay: &OverlayConfig) -> Result<Self> {
        if blur.kernel_size < 3 || blur.kernel_size % 2 == 0 {
            return Err(Error::config_validation(format!(
                "blur kernel_size ({}) must be odd and at least 3",
                blur.kernel_size
            )));
        }
        if blur.sigma <= 0.0 {
            return Err(Error::config_validation(format!(
                "blur sigma ({}) must be greater than 0",
                blur.sigma
            )));
        }

        let font = match (&overlay.font_path, overlay.enabled) {
            (Some(path), true) => {
                let bytes = fs::read(path)
                    .map_err(|e| Error::font_load(path.clone(), e.to_string()))?;
                let font = FontVec::try_from_vec(bytes)
                    .map_err(|e| Error::font_load(path.clone(), e.to_string()))?;
                Some(font)
            }
            _ => None,
        };

        if overlay.enabled {
            tracing::warn!(
                "diagnostic overlay enabled: output frames will expose classification metadata"
            );
        }

        Ok(Self {
            kernel: gaussian_kernel(blur.kernel_size, blur.sigma),
            overlay_enabled: overlay.enabled,
            font,
        })
    }

    /// Blur the region of `bbox` in `pixels`.
    ///
    /// The box is clamped to the frame; a degenerate or fully out-of-bounds
    /// box is a no-op. Returns whether any pixels were touched.
    pub fn redact(&self, pixels: &mut RgbImage, bbox: &BoundingBox) -> bool {
        let Some(rect) = bbox.clamp_to(pixels.width(), pixels.height()) else {
            return false;
        };
        self.blur_rect(pixels, rect);
        true
    }

    /// Blur a detection's region and, when enabled, draw its diagnostic
    /// label.
    ///
    /// Returns whether any pixels were touched.
    pub fn redact_detection(&self, pixels: &mut RgbImage, detection: &Detection) -> bool {
        let Some(rect) = detection
            .bbox
            .clamp_to(pixels.width(), pixels.height())
        else {
            return false;
        };
        self.blur_rect(pixels, rect);
        if self.overlay_enabled {
            self.draw_overlay(pixels, rect, detection);
        }
        true
    }

    fn blur_rect(&self, pixels: &mut RgbImage, rect: PixelRect) {
        let region = imageops::crop_imm(pixels, rect.x, rect.y, rect.width, rect.height)
            .to_image();
        let blurred = separable_filter_equal(&region, &self.kernel);
        imageops::replace(pixels, &blurred, i64::from(rect.x), i64::from(rect.y));
    }

    fn draw_overlay(&self, pixels: &mut RgbImage, rect: PixelRect, detection: &Detection) {
        #[allow(clippy::cast_possible_wrap)]
        let outline = Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height);
        draw_hollow_rect_mut(pixels, outline, OVERLAY_COLOR);

        if let Some(font) = &self.font {
            let label = format!(
                "{} {:.2} ID:{}",
                detection.class_label, detection.confidence, detection.track_id
            );
            #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
            let text_y = rect.y.saturating_sub(OVERLAY_TEXT_SCALE as u32 + 2) as i32;
            #[allow(clippy::cast_possible_wrap)]
            draw_text_mut(
                pixels,
                OVERLAY_COLOR,
                rect.x as i32,
                text_y,
                PxScale::from(OVERLAY_TEXT_SCALE),
                font,
                &label,
            );
        }
    }
}

/// Build a normalized 1-D Gaussian kernel.
///
/// Equivalent to OpenCV's `getGaussianKernel(size, sigma)`: the blur is run
/// as a separable horizontal/vertical pass with the same kernel.
#[allow(clippy::cast_precision_loss)]
fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let center = (size / 2) as f32;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-d * d / two_sigma_sq).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}
