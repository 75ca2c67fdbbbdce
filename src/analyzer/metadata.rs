//! Capture metadata: does the image look like it came out of a camera?
//!
//! Photos from phones and cameras carry an EXIF block naming the device and
//! the moment of capture. Generated images usually carry none, or carry an
//! authoring tag left behind by the generator.
//!
//! # Checks
//!
//! | Condition | Points | Reason |
//! |-----------|--------|--------|
//! | no EXIF block | 30 | no metadata found. |
//! | EXIF lacks make or model | 20 | missing camera manufacturer or model info. |
//! | EXIF lacks DateTimeOriginal | 10 | original capture timestamp missing. |
//! | Software names a generator | 50 | generative software signature detected: .. |
//! | Software names an editor | 10 | edited with external software: .. |
//! | EXIF present but unparseable | 10 | metadata structure is unreadable |
//!
//! An unreadable block is a parse failure, not an absence: it scores on its
//! own and none of the field checks run.

use super::{Findings, ImageFile};
use crate::config::MetadataWeights;
use exif::{Exif, In, Tag, Value};
use image::ImageFormat;
use serde::Serialize;
use std::io::Cursor;
use tracing::{debug, warn};

pub const REASON_NO_METADATA: &str = "no metadata found.";
pub const REASON_MISSING_CAMERA: &str = "missing camera manufacturer or model info.";
pub const REASON_MISSING_TIMESTAMP: &str = "original capture timestamp missing.";
pub const REASON_UNREADABLE: &str = "metadata structure is unreadable";

/// The capture fields the scorer looks at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    pub date_time_original: Option<String>,
    pub software: Option<String>,
}

/// What the metadata reader found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MetadataState {
    /// No EXIF block in the container
    Absent,
    /// A block exists but could not be parsed
    Unreadable { detail: String },
    Present(CaptureMetadata),
}

impl Default for MetadataState {
    fn default() -> Self {
        Self::Absent
    }
}

/// Classification of a Software tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftwareKind {
    Generative,
    Editor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataFindings {
    #[serde(flatten)]
    pub findings: Findings,
    pub metadata: MetadataState,
}

/// Read and score the metadata of an image. Never fails.
pub fn inspect(image: &ImageFile, weights: &MetadataWeights) -> MetadataFindings {
    let metadata = read(image.bytes());
    debug!(?metadata, "metadata");

    MetadataFindings {
        findings: score(&metadata, weights),
        metadata,
    }
}

/// Formats the EXIF reader can look inside
const EXIF_CONTAINERS: [ImageFormat; 4] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Tiff, ImageFormat::WebP];

/// Parse the EXIF block out of any supported container.
///
/// A recognised format the reader cannot look inside (GIF, BMP) is
/// unreadable, not absent.
pub fn read(bytes: &[u8]) -> MetadataState {
    if let Ok(format) = image::guess_format(bytes) {
        if !EXIF_CONTAINERS.contains(&format) {
            warn!(?format, "metadata structure is unreadable");
            return MetadataState::Unreadable {
                detail: format!("unsupported metadata container: {:?}", format),
            };
        }
    }

    let mut cursor = Cursor::new(bytes);
    match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => MetadataState::Present(capture_fields(&exif)),
        Err(exif::Error::NotFound(_)) => MetadataState::Absent,
        Err(e) => {
            warn!(error = %e, "metadata structure is unreadable");
            MetadataState::Unreadable {
                detail: e.to_string(),
            }
        }
    }
}

fn capture_fields(exif: &Exif) -> CaptureMetadata {
    CaptureMetadata {
        make: text_field(exif, Tag::Make),
        model: text_field(exif, Tag::Model),
        date_time_original: text_field(exif, Tag::DateTimeOriginal),
        software: text_field(exif, Tag::Software),
    }
}

/// Field text with NUL padding and surrounding whitespace removed; blank is None
fn text_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let text = match field.value {
        Value::Ascii(ref parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect::<Vec<_>>()
            .join(" "),
        _ => field.display_value().to_string(),
    };

    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Match a Software tag against the known signatures, generators first
pub fn classify_software(software: &str, weights: &MetadataWeights) -> Option<SoftwareKind> {
    let lower = software.to_lowercase();
    let matches = |sigs: &[String]| sigs.iter().any(|s| lower.contains(&s.to_lowercase()));

    if matches(&weights.generator_signatures) {
        Some(SoftwareKind::Generative)
    } else if matches(&weights.editor_signatures) {
        Some(SoftwareKind::Editor)
    } else {
        None
    }
}

/// Score a metadata state. Reasons follow check order.
pub fn score(metadata: &MetadataState, weights: &MetadataWeights) -> Findings {
    let mut findings = Findings::default();

    let meta = match metadata {
        MetadataState::Absent => {
            findings.add(weights.no_metadata, REASON_NO_METADATA);
            return findings;
        }
        MetadataState::Unreadable { .. } => {
            findings.add(weights.unreadable, REASON_UNREADABLE);
            return findings;
        }
        MetadataState::Present(meta) => meta,
    };

    if meta.make.is_none() || meta.model.is_none() {
        findings.add(weights.missing_camera, REASON_MISSING_CAMERA);
    }

    if meta.date_time_original.is_none() {
        findings.add(weights.missing_timestamp, REASON_MISSING_TIMESTAMP);
    }

    if let Some(ref software) = meta.software {
        match classify_software(software, weights) {
            Some(SoftwareKind::Generative) => findings.add(
                weights.generative_software,
                format!("generative software signature detected: {}", software),
            ),
            Some(SoftwareKind::Editor) => findings.add(
                weights.editing_software,
                format!("edited with external software: {}", software),
            ),
            None => {}
        }
    }

    findings
}
