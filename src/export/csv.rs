use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::indexer::types::SwapRecord;

/// Write the full record set as CSV, replacing any previous file at `path`.
///
/// Rows go to a sibling temp file that is renamed over the target, so an
/// interrupted write never leaves a half-written file behind. The header is
/// always written, even for an empty set.
pub fn write_swaps_csv(path: impl AsRef<Path>, records: &[SwapRecord]) -> eyre::Result<usize> {
    let path = path.as_ref();
    write_atomically(path, &SwapRecord::COLUMNS, records)?;

    tracing::info!(path = %path.display(), rows = records.len(), "Swaps written to CSV");
    Ok(records.len())
}

/// Write `header` and `rows` to the temp file, then rename it over `path`.
/// On any failure the temp file is removed again.
fn write_atomically<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> eyre::Result<()> {
    let tmp_path = temp_path_for(path);

    let result = write_rows(&tmp_path, header, rows).and_then(|()| {
        std::fs::rename(&tmp_path, path).map_err(|e| {
            eyre::eyre!(
                "Failed to move '{}' into place at '{}': {}",
                tmp_path.display(),
                path.display(),
                e
            )
        })
    });

    if result.is_err() && tmp_path.exists() {
        if let Err(e) = std::fs::remove_file(&tmp_path) {
            tracing::warn!(path = %tmp_path.display(), error = %e, "Failed to remove temp CSV");
        }
    }
    result
}

fn write_rows<T: Serialize>(tmp_path: &Path, header: &[&str], rows: &[T]) -> eyre::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp_path)
        .map_err(|e| eyre::eyre!("Failed to create CSV '{}': {}", tmp_path.display(), e))?;

    writer.write_record(header)?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| eyre::eyre!("Failed to write CSV row: {}", e))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a CSV previously produced by [`write_swaps_csv`].
pub fn read_swaps_csv(path: impl AsRef<Path>) -> eyre::Result<Vec<SwapRecord>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("Failed to open CSV '{}': {}", path.display(), e))?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
