//! Report output.
//!
//! Reports land next to their input: `rounds.json` -> `rounds_verified.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::InputError;

/// Suffix for verification reports.
pub const VERIFIED_SUFFIX: &str = "_verified";

/// Suffix for analysis reports.
pub const ANALYSIS_SUFFIX: &str = "_analysis";

/// Sibling of `input` with `suffix` inserted before the extension.
///
/// Inputs without an extension get `.json`.
pub fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "json".to_string());
    input.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}

/// Pretty-print `value` as JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), InputError> {
    let json = serde_json::to_string_pretty(value).map_err(InputError::Serialize)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| InputError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| InputError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_path() {
        assert_eq!(
            sibling_path(Path::new("data/session.json"), VERIFIED_SUFFIX),
            PathBuf::from("data/session_verified.json")
        );
        assert_eq!(
            sibling_path(Path::new("samples.json"), ANALYSIS_SUFFIX),
            PathBuf::from("samples_analysis.json")
        );
        assert_eq!(
            sibling_path(Path::new("/tmp/export"), VERIFIED_SUFFIX),
            PathBuf::from("/tmp/export_verified.json")
        );
    }

    #[test]
    fn test_write_json_creates_parents() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = tmp.path().join("nested").join("out.json");

        write_json(&path, &vec![1, 2, 3]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let back: Vec<u32> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
