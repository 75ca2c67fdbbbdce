//! Finding image files to scan

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions picked up when walking a directory
pub const SUPPORTED_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// A single file is returned as-is; a directory is walked recursively.
/// A path that does not exist yields nothing.
pub fn collect_images(path: &Path) -> Vec<PathBuf> {
    if path.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_supported(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        files
    } else if path.exists() {
        vec![path.to_path_buf()]
    } else {
        vec![]
    }
}
