//! Zip archive extraction.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Extract every entry of the zip at `archive` into `dest`.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a zip archive", archive.display()))?;
    fs::create_dir_all(dest)?;
    zip.extract(dest)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;
    Ok(())
}

/// Locate the source root inside an extracted archive.
///
/// Archives of a ref conventionally hold one folder named `<tool>-<ref>`.
/// Hosts that rename it (GitHub drops a leading `v` from tags) still
/// produce a single top-level folder, which is used instead.
pub fn source_root(extracted: &Path, expected: &str) -> Result<PathBuf> {
    let named = extracted.join(expected);
    if named.is_dir() {
        return Ok(named);
    }

    let dirs: Vec<PathBuf> = fs::read_dir(extracted)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();

    match dirs.as_slice() {
        [only] => Ok(only.clone()),
        _ => anyhow::bail!(
            "Archive does not contain '{}' ({} top-level folders found)",
            expected,
            dirs.len()
        ),
    }
}
