//! Fakeshot - Estimate whether an image is AI-generated or manipulated
//!
//! Fakeshot looks at an image two independent ways and adds up what looks
//! off. The result is a 0-100 risk score, a low/medium/high tier and a list
//! of human-readable reasons. It is a screening heuristic, not a forensic
//! classifier.
//!
//! # Detection Methods
//!
//! 1. **Metadata Inspection**: Cameras write their make, model and capture
//!    time into EXIF. Generated images usually carry none of it, and some
//!    generators and editors sign the `Software` tag.
//!
//! 2. **Pixel Statistics**: Camera sensors leave noise behind. The variance
//!    of per-pixel brightness is measured and unusually smooth images are
//!    flagged, as are large images with too little texture.
//!
//! # Quick Start
//!
//! ```no_run
//! use fakeshot::{Analyzer, ImageFile, RiskLevel};
//!
//! let analyzer = Analyzer::new();
//! let image = ImageFile::from_path("suspicious.jpg")?;
//! let result = analyzer.analyze(&image)?;
//!
//! match result.risk_level {
//!     RiskLevel::Low => println!("Nothing stands out"),
//!     RiskLevel::Medium => println!("Worth a second look"),
//!     RiskLevel::High => println!("Likely generated or manipulated"),
//! }
//!
//! println!("Score: {}/100", result.total_score);
//! println!("Reasons: {:?}", result.reasons);
//! # Ok::<(), fakeshot::AnalysisError>(())
//! ```
//!
//! # Scoring System
//!
//! | Score Range | Risk | Meaning |
//! |-------------|------|---------|
//! | 0-35 | low | No strong indicators |
//! | 36-65 | medium | Some indicators, treat with caution |
//! | 66-100 | high | Patterns common in generated media |
//!
//! Every weight and cutoff can be overridden with a [`ScoringConfig`].
//!
//! # Modules
//!
//! - [`analyzer`]: Core engine combining metadata and pixel stages
//! - [`verdict`]: User-facing labels and recommendations
//! - [`report`]: Output formatters (JSON, CSV)
//! - [`serve`]: Local web UI

pub mod analyzer;
pub mod config;
pub mod error;
pub mod report;
pub mod scan;
pub mod serve;
pub mod verdict;

pub use analyzer::{AnalysisResult, Analyzer, ImageFile, Inspection, RiskLevel, ScanRecord};
pub use config::ScoringConfig;
pub use error::{AnalysisError, ConfigError};
pub use verdict::Verdict;
