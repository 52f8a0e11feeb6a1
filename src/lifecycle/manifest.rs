//! Detecting an existing checkout of the target.
//!
//! When `create` runs inside a checkout of the target with no explicit
//! path or ref, that checkout becomes the instance instead of fetching a
//! fresh copy. A directory counts as a checkout only when its manifest
//! declares both the expected name and the configured homepage. Without a
//! configured homepage nothing is reused, since a name alone is too common.

use crate::config::TargetProfile;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The fields of a `package.json`-style manifest that identify a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
}

/// Read the manifest in `dir`. Missing or unparsable manifests read as `None`.
pub fn read_manifest(dir: &Path, file_name: &str) -> Option<Manifest> {
    let path = dir.join(file_name);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            tracing::debug!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Whether `dir` holds a checkout of the target.
pub fn is_target_checkout(dir: &Path, target: &TargetProfile) -> bool {
    let Some(expected_homepage) = target.manifest_homepage.as_deref() else {
        return false;
    };
    let Some(manifest) = read_manifest(dir, &target.manifest_file) else {
        return false;
    };

    if manifest.name.as_deref() != Some(target.expected_manifest_name()) {
        return false;
    }

    manifest
        .homepage
        .as_deref()
        .is_some_and(|found| same_url(found, expected_homepage))
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/').eq_ignore_ascii_case(b.trim_end_matches('/'))
}
