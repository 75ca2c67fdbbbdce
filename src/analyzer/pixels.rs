//! Pixel statistics: how much brightness noise does the image carry?
//!
//! Camera sensors leave noise in every capture. Diffusion models and heavy
//! denoising tend to produce images whose brightness varies far less than a
//! real photo of the same scene. This stage decodes the image, reduces every
//! pixel to one brightness value and measures the spread.
//!
//! ```text
//! brightness b = (r + g + b) / 3           alpha is ignored
//! mean       m = sum(b) / N
//! variance   v = sum((b - m)^2) / N         population variance, not N - 1
//! ```
//!
//! Scoring (defaults):
//!
//! | Rule | Condition | Points |
//! |------|-----------|--------|
//! | smooth | v < 350 | 30 |
//! | low noise | v < 500 (only if not smooth) | 15 |
//! | texture | N > 2,000,000 and v < 400 | 15 |
//!
//! The first two are exclusive bands. The texture rule is independent and
//! stacks with either band.

use super::rules::{self, Rule};
use super::{Findings, ImageFile};
use crate::config::PixelWeights;
use crate::error::AnalysisError;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader, RgbImage};
use serde::Serialize;
use std::io::Cursor;
use tracing::{debug, warn};

pub const REASON_SMOOTH: &str = "unnaturally smooth pixel distribution";
pub const REASON_LOW_NOISE: &str = "lower than average image noise levels";
pub const REASON_TEXTURE: &str = "high resolution with inconsistent texture detail";

/// Measured brightness statistics of a decoded image
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PixelStats {
    pub width: u32,
    pub height: u32,
    pub pixel_count: u64,
    pub mean: f64,
    pub variance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PixelFindings {
    #[serde(flatten)]
    pub findings: Findings,
    pub stats: PixelStats,
}

/// Decode, measure and score an image
pub fn analyze(image: &ImageFile, weights: &PixelWeights) -> Result<PixelFindings, AnalysisError> {
    let decoded = decode(image.bytes(), image.media_type())?;
    let stats = measure(&decoded)?;

    debug!(
        width = stats.width,
        height = stats.height,
        mean = stats.mean,
        variance = stats.variance,
        "pixel statistics"
    );

    Ok(score(stats, weights))
}

/// Decode image bytes, sniffing the real format before trusting the declared one
pub fn decode(bytes: &[u8], media_type: &str) -> Result<DynamicImage, AnalysisError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(media_type, ImageError::IoError(e)))?;

    if reader.format().is_none() {
        if let Some(format) = ImageFormat::from_mime_type(media_type) {
            reader.set_format(format);
        }
    }

    reader.decode().map_err(|e| {
        warn!(media_type, error = %e, "image decode failed");
        decode_error(media_type, e)
    })
}

fn decode_error(media_type: &str, source: ImageError) -> AnalysisError {
    AnalysisError::ImageDecode {
        media_type: media_type.to_string(),
        source,
    }
}

/// Compute brightness mean and population variance over all pixels
pub fn measure(image: &DynamicImage) -> Result<PixelStats, AnalysisError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let pixel_count = u64::from(width) * u64::from(height);

    if pixel_count == 0 {
        return Err(AnalysisError::EmptyImage { width, height });
    }

    let (mean, variance) = brightness_moments(&rgb);

    Ok(PixelStats {
        width,
        height,
        pixel_count,
        mean,
        variance,
    })
}

fn brightness(p: &image::Rgb<u8>) -> f64 {
    (f64::from(p[0]) + f64::from(p[1]) + f64::from(p[2])) / 3.0
}

/// Two-pass mean and population variance of per-pixel brightness
fn brightness_moments(rgb: &RgbImage) -> (f64, f64) {
    let n = (u64::from(rgb.width()) * u64::from(rgb.height())) as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }

    let mean = rgb.pixels().map(brightness).sum::<f64>() / n;
    let variance = rgb
        .pixels()
        .map(|p| {
            let d = brightness(p) - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    (mean, variance)
}

/// Mutually exclusive smoothness bands, most severe first
pub fn band_rules(weights: &PixelWeights) -> Vec<Rule<PixelStats>> {
    let smooth = weights.smooth_below;
    let low_noise = weights.low_noise_below;

    vec![
        Rule::new("smooth", weights.smooth_weight, REASON_SMOOTH, move |s: &PixelStats| {
            s.variance < smooth
        }),
        Rule::new("low_noise", weights.low_noise_weight, REASON_LOW_NOISE, move |s: &PixelStats| {
            s.variance < low_noise
        }),
    ]
}

/// Independent checks that stack on top of the band
pub fn texture_rules(weights: &PixelWeights) -> Vec<Rule<PixelStats>> {
    let min_pixels = weights.large_image_pixels;
    let below = weights.texture_below;

    vec![Rule::new("texture", weights.texture_weight, REASON_TEXTURE, move |s: &PixelStats| {
        s.pixel_count > min_pixels && s.variance < below
    })]
}

/// Score measured statistics
pub fn score(stats: PixelStats, weights: &PixelWeights) -> PixelFindings {
    let mut findings = Findings::default();

    rules::first_match(&band_rules(weights), &stats, &mut findings);
    rules::every_match(&texture_rules(weights), &stats, &mut findings);

    PixelFindings { findings, stats }
}
