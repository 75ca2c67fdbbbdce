//! CSV report output

use crate::analyzer::metadata::MetadataState;
use crate::analyzer::ScanRecord;
use std::io::{self, Write};

const HEADER: &str = "file_path,file_name,media_type,risk_level,total_score,width,height,variance,metadata,reasons,error";

pub fn write<W: Write>(writer: &mut W, records: &[ScanRecord]) -> io::Result<()> {
    writeln!(writer, "{}", HEADER)?;

    for r in records {
        let metadata = match r.metadata {
            Some(MetadataState::Absent) => "absent",
            Some(MetadataState::Unreadable { .. }) => "unreadable",
            Some(MetadataState::Present(_)) => "present",
            None => "",
        };
        let (width, height, variance) = r
            .pixels
            .map(|p| (p.width.to_string(), p.height.to_string(), format!("{:.2}", p.variance)))
            .unwrap_or_default();

        let fields = [
            escape(&r.file_path),
            escape(&r.file_name),
            escape(&r.media_type),
            r.risk_level.map(|l| l.to_string()).unwrap_or_else(|| "error".to_string()),
            r.total_score.map(|s| s.to_string()).unwrap_or_default(),
            width,
            height,
            variance,
            metadata.to_string(),
            escape(&r.reasons.join("; ")),
            escape(r.error.as_deref().unwrap_or("")),
        ];
        writeln!(writer, "{}", fields.join(","))?;
    }

    Ok(())
}

/// Quote a field if it contains a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
