//! Report generation for batch scans
//!
//! - **JSON**: machine-readable, with summary counts and per-stage details
//! - **CSV**: spreadsheet-compatible, one row per file
//!
//! ```ignore
//! use fakeshot::report;
//!
//! // Picks the format from the extension
//! report::generate("scan.json", &records)?;  // JSON
//! report::generate("scan.csv", &records)?;   // CSV
//! ```

pub mod csv;
pub mod json;

use crate::analyzer::{RiskLevel, ScanRecord};
use serde::Serialize;
use std::io;
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, records: &[ScanRecord]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, records),
        _ => csv::write(&mut file, records),
    }
}

/// Summary statistics for a batch of records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_records(records: &[ScanRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };

        for r in records {
            match r.risk_level {
                _ if r.is_error() => summary.error += 1,
                Some(RiskLevel::Low) => summary.low += 1,
                Some(RiskLevel::Medium) => summary.medium += 1,
                Some(RiskLevel::High) => summary.high += 1,
                None => summary.error += 1,
            }
        }

        summary
    }
}

#[cfg(test)]
pub(crate) fn test_record(risk: Option<RiskLevel>, name: &str) -> ScanRecord {
    ScanRecord {
        file_path: format!("/photos/{}", name),
        file_name: name.to_string(),
        media_type: "image/jpeg".to_string(),
        total_score: risk.map(|r| match r {
            RiskLevel::Low => 10,
            RiskLevel::Medium => 45,
            RiskLevel::High => 80,
        }),
        risk_level: risk,
        reasons: risk
            .map(|_| vec!["no metadata found.".to_string()])
            .unwrap_or_default(),
        metadata: None,
        pixels: None,
        error: if risk.is_none() {
            Some("could not decode image/jpeg image".to_string())
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_records(&[]);
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_summary_mixed() {
        let records = vec![
            test_record(Some(RiskLevel::Low), "a.jpg"),
            test_record(Some(RiskLevel::Low), "b.jpg"),
            test_record(Some(RiskLevel::Medium), "c.jpg"),
            test_record(Some(RiskLevel::High), "d.jpg"),
            test_record(None, "e.jpg"),
        ];
        let summary = Summary::from_records(&records);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.low, 2);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.error, 1);
    }

    #[test]
    fn test_generate_picks_format_from_extension() {
        let dir = std::env::temp_dir().join(format!("fakeshot-report-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let records = vec![test_record(Some(RiskLevel::High), "x.jpg")];

        let json_path = dir.join("scan.json");
        generate(&json_path, &records).unwrap();
        let text = std::fs::read_to_string(&json_path).unwrap();
        assert!(text.trim_start().starts_with('{'));

        let csv_path = dir.join("scan.csv");
        generate(&csv_path, &records).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("file_path,"));
    }
}
