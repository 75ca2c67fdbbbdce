//! What the user is shown for a finished (or failed) scan
//!
//! The engine only produces an [`AnalysisResult`] or an [`AnalysisError`].
//! Front ends turn either into a [`Verdict`]: a tier, the indicators behind
//! it, and advice. A failed scan still yields a verdict, a cautious medium
//! one flagged as degraded, so the page never claims a clean result it
//! could not measure.

use crate::analyzer::{AnalysisResult, RiskLevel};
use crate::error::AnalysisError;
use serde::Serialize;

pub const DEGRADED_INDICATORS: [&str; 2] = ["Analysis process interrupted", "Please try another file"];
pub const DEGRADED_RECOMMENDATION: &str = "We couldn't complete the scan perfectly. Please try again.";

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Low => {
                "While this scan shows low risk indicators, no tool can guarantee authenticity. \
                 If you have concerns, proceed with caution and follow the preservation steps below."
            }
            Self::Medium => {
                "This content shows some indicators that warrant attention (such as missing \
                 metadata or unusual noise levels). This is not confirmation of manipulation, \
                 but we recommend treating it with caution."
            }
            Self::High => {
                "This content shows patterns commonly associated with AI-generated or manipulated \
                 media (such as generative software signatures or unnatural smoothness). We \
                 strongly recommend treating this as potentially fake."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub risk_level: RiskLevel,
    pub label: String,
    pub indicators: Vec<String>,
    pub recommendation: String,
    /// True when the scan failed and this is the fallback verdict
    pub degraded: bool,
}

impl Verdict {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            risk_level: result.risk_level,
            label: result.risk_level.label().to_string(),
            indicators: result.reasons.clone(),
            recommendation: result.risk_level.recommendation().to_string(),
            degraded: false,
        }
    }

    pub fn degraded() -> Self {
        Self {
            risk_level: RiskLevel::Medium,
            label: RiskLevel::Medium.label().to_string(),
            indicators: DEGRADED_INDICATORS.iter().map(|s| s.to_string()).collect(),
            recommendation: DEGRADED_RECOMMENDATION.to_string(),
            degraded: true,
        }
    }

    pub fn from_outcome(outcome: &Result<AnalysisResult, AnalysisError>) -> Self {
        match outcome {
            Ok(result) => Self::from_result(result),
            Err(_) => Self::degraded(),
        }
    }
}
