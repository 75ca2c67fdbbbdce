//! Scoring weights and thresholds
//!
//! The defaults reproduce the fixed heuristic constants the scorer has always
//! used. They were picked by inspection, not calibrated against a labelled
//! dataset, so they are kept in one place and can be overridden from a JSON
//! file:
//!
//! ```json
//! { "tiers": { "medium_above": 40 }, "pixels": { "smooth_below": 300.0 } }
//! ```
//!
//! Any field left out keeps its default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub metadata: MetadataWeights,
    pub pixels: PixelWeights,
    pub tiers: TierThresholds,
}

/// Weights applied by the metadata stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataWeights {
    pub no_metadata: u32,
    pub missing_camera: u32,
    pub missing_timestamp: u32,
    pub generative_software: u32,
    pub editing_software: u32,
    pub unreadable: u32,
    /// Fragments that identify image generators (matched case-insensitively)
    pub generator_signatures: Vec<String>,
    /// Fragments that identify conventional raster editors (matched case-insensitively)
    pub editor_signatures: Vec<String>,
}

impl Default for MetadataWeights {
    fn default() -> Self {
        Self {
            no_metadata: 30,
            missing_camera: 20,
            missing_timestamp: 10,
            generative_software: 50,
            editing_software: 10,
            unreadable: 10,
            generator_signatures: [
                "stable diffusion",
                "midjourney",
                "dall",
                "generated",
                "adobe firefly",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            editor_signatures: vec!["photoshop".to_string(), "gimp".to_string()],
        }
    }
}

/// Thresholds and weights applied by the pixel stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelWeights {
    /// Brightness variance below this is "unnaturally smooth"
    pub smooth_below: f64,
    pub smooth_weight: u32,
    /// Brightness variance below this (and not smooth) is "low noise"
    pub low_noise_below: f64,
    pub low_noise_weight: u32,
    /// Pixel count above which the texture check applies
    pub large_image_pixels: u64,
    pub texture_below: f64,
    pub texture_weight: u32,
}

impl Default for PixelWeights {
    fn default() -> Self {
        Self {
            smooth_below: 350.0,
            smooth_weight: 30,
            low_noise_below: 500.0,
            low_noise_weight: 15,
            large_image_pixels: 2_000_000,
            texture_below: 400.0,
            texture_weight: 15,
        }
    }
}

/// Score cutoffs for the risk tiers (both exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub medium_above: u8,
    pub high_above: u8,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium_above: 35,
            high_above: 65,
        }
    }
}

impl ScoringConfig {
    /// Load a config file, filling unspecified fields with defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tiers = &self.tiers;
        if tiers.medium_above >= tiers.high_above {
            return Err(ConfigError::Invalid(format!(
                "medium_above ({}) must be below high_above ({})",
                tiers.medium_above, tiers.high_above
            )));
        }
        if tiers.high_above > 100 {
            return Err(ConfigError::Invalid(format!(
                "high_above ({}) exceeds the maximum score of 100",
                tiers.high_above
            )));
        }

        let px = &self.pixels;
        for (name, value) in [
            ("smooth_below", px.smooth_below),
            ("low_noise_below", px.low_noise_below),
            ("texture_below", px.texture_below),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if px.smooth_below >= px.low_noise_below {
            return Err(ConfigError::Invalid(format!(
                "smooth_below ({}) must be below low_noise_below ({})",
                px.smooth_below, px.low_noise_below
            )));
        }

        let md = &self.metadata;
        if md
            .generator_signatures
            .iter()
            .chain(md.editor_signatures.iter())
            .any(|s| s.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "software signatures must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // DEFAULTS
    // ==========================================================================
    //
    // Metadata:  none 30 | camera 20 | timestamp 10 | generator 50 | editor 10
    //            unreadable 10
    // Pixels:    variance < 350 -> 30, else < 500 -> 15
    //            > 2,000,000 px and variance < 400 -> 15
    // Tiers:     > 65 high, > 35 medium, else low
    // ==========================================================================

    #[test]
    fn test_default_weights() {
        let cfg = ScoringConfig::default();

        assert_eq!(cfg.metadata.no_metadata, 30);
        assert_eq!(cfg.metadata.missing_camera, 20);
        assert_eq!(cfg.metadata.missing_timestamp, 10);
        assert_eq!(cfg.metadata.generative_software, 50);
        assert_eq!(cfg.metadata.editing_software, 10);
        assert_eq!(cfg.metadata.unreadable, 10);

        assert_eq!(cfg.pixels.smooth_below, 350.0);
        assert_eq!(cfg.pixels.smooth_weight, 30);
        assert_eq!(cfg.pixels.low_noise_below, 500.0);
        assert_eq!(cfg.pixels.low_noise_weight, 15);
        assert_eq!(cfg.pixels.large_image_pixels, 2_000_000);
        assert_eq!(cfg.pixels.texture_below, 400.0);
        assert_eq!(cfg.pixels.texture_weight, 15);

        assert_eq!(cfg.tiers, TierThresholds { medium_above: 35, high_above: 65 });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_default_signatures() {
        let md = MetadataWeights::default();
        assert!(md.generator_signatures.contains(&"midjourney".to_string()));
        assert!(md.generator_signatures.contains(&"adobe firefly".to_string()));
        assert_eq!(md.editor_signatures, vec!["photoshop", "gimp"]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = ScoringConfig::from_json(r#"{ "tiers": { "medium_above": 40 } }"#).unwrap();

        assert_eq!(cfg.tiers.medium_above, 40);
        assert_eq!(cfg.tiers.high_above, 65);
        assert_eq!(cfg.pixels, PixelWeights::default());
        assert_eq!(cfg.metadata, MetadataWeights::default());
    }

    #[test]
    fn test_empty_json_is_default() {
        let cfg = ScoringConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ScoringConfig::default());
    }

    #[test]
    fn test_rejects_inverted_tiers() {
        let err = ScoringConfig::from_json(
            r#"{ "tiers": { "medium_above": 70, "high_above": 65 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_high_tier_above_100() {
        let mut cfg = ScoringConfig::default();
        cfg.tiers.high_above = 101;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_overlapping_variance_bands() {
        let mut cfg = ScoringConfig::default();
        cfg.pixels.smooth_below = 600.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.pixels.texture_below = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_signature() {
        let mut cfg = ScoringConfig::default();
        cfg.metadata.editor_signatures.push("  ".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = ScoringConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ScoringConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
