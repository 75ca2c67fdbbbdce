//! Risk scoring engine
//!
//! Two independent stages look at the same image:
//!
//! 1. [`metadata`]: capture metadata (EXIF). Never fails; an unreadable block
//!    becomes a scoring signal.
//! 2. [`pixels`]: brightness noise statistics. Fails if the image cannot be
//!    decoded, because a missing pixel signal is not a clean bill of health.
//!
//! The stages share nothing and run concurrently. Their sub-scores are summed,
//! capped at 100 and mapped to a [`RiskLevel`]. Reasons are always listed
//! metadata first, then pixels, whichever stage finishes first.
//!
//! | Score | Risk |
//! |-------|------|
//! | 0-35 | low |
//! | 36-65 | medium |
//! | 66-100 | high |

pub mod metadata;
pub mod pixels;
pub mod rules;

#[cfg(test)]
mod fixtures;

use crate::config::{ScoringConfig, TierThresholds};
use crate::error::AnalysisError;
use metadata::{MetadataFindings, MetadataState};
use pixels::{PixelFindings, PixelStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::debug;

pub const MAX_SCORE: u8 = 100;

/// Reason used when neither stage found anything
pub const FALLBACK_REASON: &str = "no significant anomalies detected in metadata or pixel structure.";

/// Image bytes plus the media type the caller declared for them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    bytes: Vec<u8>,
    media_type: String,
}

impl ImageFile {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    /// Read a file, deriving the media type from its extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(bytes, media_type_for_path(path)))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME type for a path's extension, `application/octet-stream` if unknown
pub fn media_type_for_path(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

/// Sub-score and reasons produced by one stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Findings {
    pub score: u32,
    pub reasons: Vec<String>,
}

impl Findings {
    pub fn add(&mut self, weight: u32, reason: impl Into<String>) {
        self.score = self.score.saturating_add(weight);
        self.reasons.push(reason.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier for a capped score; both cutoffs are exclusive
    pub fn from_score(score: u8, tiers: &TierThresholds) -> Self {
        if score > tiers.high_above {
            Self::High
        } else if score > tiers.medium_above {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_score: u8,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
}

/// Both stage outputs for one image, before aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub metadata: MetadataFindings,
    pub pixels: PixelFindings,
}

impl Inspection {
    /// Sum, cap, tier and concatenate reasons (metadata first)
    pub fn aggregate(&self, tiers: &TierThresholds) -> AnalysisResult {
        let meta = &self.metadata.findings;
        let px = &self.pixels.findings;

        let sum = meta.score.saturating_add(px.score);
        let total_score = sum.min(u32::from(MAX_SCORE)) as u8;

        let mut reasons: Vec<String> = meta.reasons.iter().chain(px.reasons.iter()).cloned().collect();
        if reasons.is_empty() {
            reasons.push(FALLBACK_REASON.to_string());
        }

        AnalysisResult {
            total_score,
            risk_level: RiskLevel::from_score(total_score, tiers),
            reasons,
        }
    }
}

/// Per-file outcome of a batch scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    pub file_path: String,
    pub file_name: String,
    pub media_type: String,
    pub total_score: Option<u8>,
    pub risk_level: Option<RiskLevel>,
    pub reasons: Vec<String>,
    pub metadata: Option<MetadataState>,
    pub pixels: Option<PixelStats>,
    pub error: Option<String>,
}

impl ScanRecord {
    fn new(path: &Path, media_type: String) -> Self {
        Self {
            file_path: path.display().to_string(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            media_type,
            total_score: None,
            risk_level: None,
            reasons: vec![],
            metadata: None,
            pixels: None,
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Combines the metadata and pixel stages into one risk verdict
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: ScoringConfig,
    deadline: Option<Duration>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the exclusive score cutoffs for medium and high risk.
    ///
    /// Inverted cutoffs make the medium tier unreachable; run
    /// [`ScoringConfig::validate`] on the result when they come from a user.
    pub fn with_tiers(mut self, medium_above: u8, high_above: u8) -> Self {
        debug_assert!(
            medium_above < high_above,
            "medium_above ({}) must be below high_above ({})",
            medium_above,
            high_above
        );
        self.config.tiers = TierThresholds {
            medium_above,
            high_above,
        };
        self
    }

    /// Bound every [`analyze_path`](Self::analyze_path) call by a deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Run both stages concurrently
    pub fn inspect(&self, image: &ImageFile) -> Result<Inspection, AnalysisError> {
        if image.is_empty() {
            return Err(AnalysisError::MissingInput);
        }

        let (metadata, pixels) = rayon::join(
            || metadata::inspect(image, &self.config.metadata),
            || pixels::analyze(image, &self.config.pixels),
        );

        Ok(Inspection {
            metadata,
            pixels: pixels?,
        })
    }

    /// Run both stages one after the other on the calling thread
    fn inspect_sequential(&self, image: &ImageFile) -> Result<Inspection, AnalysisError> {
        if image.is_empty() {
            return Err(AnalysisError::MissingInput);
        }

        let metadata = metadata::inspect(image, &self.config.metadata);
        let pixels = pixels::analyze(image, &self.config.pixels)?;
        Ok(Inspection { metadata, pixels })
    }

    /// Score one image
    pub fn analyze(&self, image: &ImageFile) -> Result<AnalysisResult, AnalysisError> {
        let inspection = self.inspect(image)?;
        let result = inspection.aggregate(&self.config.tiers);
        debug!(
            bytes = image.len(),
            media_type = image.media_type(),
            score = result.total_score,
            risk = %result.risk_level,
            "analysis complete"
        );
        Ok(result)
    }

    /// Like [`inspect`](Self::inspect), but gives up after `deadline`.
    ///
    /// The work runs on its own thread so the caller's thread (possibly a
    /// rayon worker) is never parked waiting on the pool.
    pub fn inspect_within(
        &self,
        image: ImageFile,
        deadline: Duration,
    ) -> Result<Inspection, AnalysisError> {
        let (tx, rx) = mpsc::channel();
        let analyzer = self.clone();

        std::thread::Builder::new()
            .name("fakeshot-analysis".to_string())
            .spawn(move || {
                // The receiver is gone once the deadline passes
                let _ = tx.send(analyzer.inspect_sequential(&image));
            })
            .map_err(|_| AnalysisError::Interrupted)?;

        match rx.recv_timeout(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(AnalysisError::DeadlineExceeded(deadline)),
            Err(RecvTimeoutError::Disconnected) => Err(AnalysisError::Interrupted),
        }
    }

    /// Like [`analyze`](Self::analyze), but gives up after `deadline`
    pub fn analyze_within(
        &self,
        image: ImageFile,
        deadline: Duration,
    ) -> Result<AnalysisResult, AnalysisError> {
        let inspection = self.inspect_within(image, deadline)?;
        Ok(inspection.aggregate(&self.config.tiers))
    }

    /// Analyze a file on disk. Failures are recorded, never returned.
    pub fn analyze_path<P: AsRef<Path>>(&self, path: P) -> ScanRecord {
        let path = path.as_ref();
        let mut record = ScanRecord::new(path, media_type_for_path(path));

        let outcome = ImageFile::from_path(path).and_then(|image| match self.deadline {
            Some(deadline) => self.inspect_within(image, deadline),
            None => self.inspect(&image),
        });

        match outcome {
            Ok(inspection) => {
                let result = inspection.aggregate(&self.config.tiers);
                record.total_score = Some(result.total_score);
                record.risk_level = Some(result.risk_level);
                record.reasons = result.reasons;
                record.metadata = Some(inspection.metadata.metadata);
                record.pixels = Some(inspection.pixels.stats);
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "scan failed");
                record.error = Some(e.to_string());
            }
        }

        record
    }
}
