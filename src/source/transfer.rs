//! Moving staged source into an instance's birth path.

use crate::error::Result;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copy the staged tree at `source` into `destination`.
///
/// A fresh destination is populated through a sibling `.<name>.partial`
/// directory that is renamed into place once the copy completes, so a
/// failed copy never leaves a half-filled birth path behind. An existing
/// destination (update) is overwritten file by file.
pub fn transfer_to_birth_path(source: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        tracing::debug!(
            "Copying {} over existing {}",
            source.display(),
            destination.display()
        );
        copy_tree(source, destination)?;
        return Ok(());
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let partial = partial_path(destination);
    if partial.exists() {
        fs::remove_dir_all(&partial)?;
    }

    tracing::debug!(
        "Copying {} to {}",
        source.display(),
        destination.display()
    );
    if let Err(e) = copy_tree(source, &partial) {
        let _ = fs::remove_dir_all(&partial);
        return Err(e.into());
    }
    fs::rename(&partial, destination)?;
    Ok(())
}

/// Sibling directory used while a fresh destination is being filled.
pub fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "instance".to_string());
    destination.with_file_name(format!(".{}.partial", name))
}

fn copy_tree(source: &Path, destination: &Path) -> anyhow::Result<()> {
    if !source.is_dir() {
        anyhow::bail!("Staged source {} is missing", source.display());
    }
    fs::create_dir_all(destination)?;

    for entry in WalkDir::new(source).follow_links(false).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source)?;
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", relative.display()))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> anyhow::Result<()> {
    let pointee = fs::read_link(link)?;
    if target.symlink_metadata().is_ok() {
        fs::remove_file(target)?;
    }
    std::os::unix::fs::symlink(pointee, target)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> anyhow::Result<()> {
    fs::copy(link, target)?;
    Ok(())
}
