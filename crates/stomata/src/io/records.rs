//! Per-image record JSON files.

use std::path::{Path, PathBuf};

use crate::error::{Result, StomataError};
use crate::record::ImageRecord;

/// Stems ending in this suffix hold ground-truth annotations.
pub const GROUND_TRUTH_SUFFIX: &str = "-gt";

pub fn is_ground_truth(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(GROUND_TRUTH_SUFFIX))
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `*.json` files of `dir`, sorted by name, ground truth excluded.
pub(crate) fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| StomataError::io(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .filter(|p| {
            let gt = is_ground_truth(p);
            if gt {
                tracing::debug!("Skipping ground truth {}", p.display());
            }
            !gt
        })
        .collect();
    files.sort();
    Ok(files)
}

pub fn record_path(dir: &Path, image_name: &str) -> PathBuf {
    dir.join(format!("{image_name}.json"))
}

/// Write `<dir>/<image_name>.json`, creating `dir` if needed.
pub fn write_image_record(dir: &Path, record: &ImageRecord) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| StomataError::io(dir, e))?;
    let path = record_path(dir, &record.image_name);
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(&path, json).map_err(|e| StomataError::io(&path, e))?;
    Ok(path)
}

/// Read one record; the image name comes from the file stem.
pub fn read_image_record(path: &Path) -> Result<ImageRecord> {
    let data = std::fs::read_to_string(path).map_err(|e| StomataError::io(path, e))?;
    let mut record: ImageRecord =
        serde_json::from_str(&data).map_err(|e| StomataError::json(path, e))?;
    record.image_name = file_stem(path);
    Ok(record)
}

/// Load every record in `dir`. Unreadable files are skipped with a warning.
pub fn load_image_records(dir: &Path) -> Result<Vec<ImageRecord>> {
    let records = json_files(dir)?
        .iter()
        .filter_map(|path| match read_image_record(path) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping record {}: {}", path.display(), e);
                None
            }
        })
        .collect::<Vec<_>>();
    tracing::info!("Loaded {} image records from {}", records.len(), dir.display());
    Ok(records)
}
