//! JSON report output

use super::Summary;
use crate::analyzer::ScanRecord;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub generated: String,
    pub summary: Summary,
    pub files: &'a [ScanRecord],
}

impl<'a> JsonReport<'a> {
    pub fn new(records: &'a [ScanRecord]) -> Self {
        Self {
            generated: chrono::Local::now().to_rfc3339(),
            summary: Summary::from_records(records),
            files: records,
        }
    }
}

pub fn write<W: Write>(writer: &mut W, records: &[ScanRecord]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &JsonReport::new(records))?;
    writeln!(writer)
}
