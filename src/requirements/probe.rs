//! Environment probe for discovering version managers and tools.
//!
//! Version managers (mise, nvm, volta, pyenv) are usually activated from an
//! interactive shell profile, so a tool installed through one of them is
//! often missing from the PATH `brood` inherits. The probe looks in the
//! managers' well-known locations and builds an augmented PATH that tool
//! checks run with. `~/.local/bin`, where user-level installers such as
//! mise's put their binaries, is added the same way.
//!
//! # Example
//!
//! ```no_run
//! use brood::requirements::probe::EnvironmentProbe;
//!
//! let probe = EnvironmentProbe::run();
//! for path in probe.augmented_path() {
//!     println!("Additional PATH entry: {}", path.display());
//! }
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// A version manager detected as installed but not active in the current shell.
#[derive(Debug, Clone)]
pub struct InactiveManager {
    pub name: String,
    pub install_path: PathBuf,
    /// Shell command that activates this manager.
    pub activation: String,
}

/// Result of probing the environment for version managers.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentProbe {
    augmented_path: Vec<PathBuf>,
    inactive_managers: Vec<InactiveManager>,
}

/// Per-user binary directory, relative to the home directory.
const USER_BIN_DIR: &str = ".local/bin";

struct ManagerDef {
    name: &'static str,
    /// Variable that relocates the manager's root.
    env_var: Option<&'static str>,
    /// Root relative to the home directory.
    default_dir: &'static str,
    /// File whose presence proves the manager is installed.
    marker: &'static str,
    /// Directories under the root to put on PATH.
    path_subdirs: &'static [&'static str],
    /// Directory of per-version installs, each with its own `bin`.
    versions_dir: Option<&'static str>,
    activation: &'static str,
}

const MANAGER_DEFS: &[ManagerDef] = &[
    ManagerDef {
        name: "mise",
        env_var: Some("MISE_DATA_DIR"),
        default_dir: ".local/share/mise",
        marker: "shims",
        path_subdirs: &["shims"],
        versions_dir: None,
        activation: "eval \"$(mise activate bash)\"",
    },
    ManagerDef {
        name: "nvm",
        env_var: Some("NVM_DIR"),
        default_dir: ".nvm",
        marker: "nvm.sh",
        path_subdirs: &[],
        versions_dir: Some("versions/node"),
        activation: "source \"$NVM_DIR/nvm.sh\"",
    },
    ManagerDef {
        name: "volta",
        env_var: Some("VOLTA_HOME"),
        default_dir: ".volta",
        marker: "bin",
        path_subdirs: &["bin"],
        versions_dir: None,
        activation: "export PATH=\"$VOLTA_HOME/bin:$PATH\"",
    },
    ManagerDef {
        name: "fnm",
        env_var: Some("FNM_DIR"),
        default_dir: ".local/share/fnm",
        marker: "node-versions",
        path_subdirs: &[],
        versions_dir: Some("node-versions"),
        activation: "eval \"$(fnm env)\"",
    },
    ManagerDef {
        name: "pyenv",
        env_var: Some("PYENV_ROOT"),
        default_dir: ".pyenv",
        marker: "bin/pyenv",
        path_subdirs: &["bin", "shims"],
        versions_dir: None,
        activation: "eval \"$(pyenv init -)\"",
    },
];

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    path_entries
        .iter()
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file() && is_executable(candidate))
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

impl EnvironmentProbe {
    /// Probe using real environment variables and the home directory.
    pub fn run() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        Self::run_with_env(&home, |key: &str| std::env::var(key))
    }

    /// Probe with a custom home and env var lookup, for tests.
    pub fn run_with_env<F>(home: &Path, env_fn: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let system_path = parse_system_path();
        let mut augmented_path: Vec<PathBuf> = Vec::new();
        let mut inactive_managers = Vec::new();

        for def in MANAGER_DEFS {
            let Some(root) = locate_manager(home, def, &env_fn) else {
                continue;
            };

            let mut additions: Vec<PathBuf> = def
                .path_subdirs
                .iter()
                .map(|sub| root.join(sub))
                .filter(|p| p.is_dir())
                .collect();
            if let Some(versions) = def.versions_dir {
                additions.extend(version_bin_dirs(&root.join(versions)));
            }

            let already_on_path =
                !additions.is_empty() && additions.iter().any(|p| system_path.contains(p));
            if !already_on_path {
                tracing::debug!("{} found at {} but not on PATH", def.name, root.display());
                inactive_managers.push(InactiveManager {
                    name: def.name.to_string(),
                    install_path: root.clone(),
                    activation: def.activation.to_string(),
                });
            }

            for path in additions {
                if !system_path.contains(&path) && !augmented_path.contains(&path) {
                    augmented_path.push(path);
                }
            }
        }

        let user_bin = home.join(USER_BIN_DIR);
        if user_bin.is_dir() && !system_path.contains(&user_bin) && !augmented_path.contains(&user_bin)
        {
            augmented_path.push(user_bin);
        }

        Self {
            augmented_path,
            inactive_managers,
        }
    }

    /// Additional PATH entries discovered by the probe.
    pub fn augmented_path(&self) -> &[PathBuf] {
        &self.augmented_path
    }

    /// Version managers that are installed but not activated.
    pub fn inactive_managers(&self) -> &[InactiveManager] {
        &self.inactive_managers
    }

    /// Augmented entries followed by the system PATH.
    pub fn full_path(&self) -> Vec<PathBuf> {
        let mut result = self.augmented_path.clone();
        result.extend(parse_system_path());
        result
    }

    /// [`full_path`](Self::full_path) joined for a `PATH` variable.
    pub fn path_value(&self) -> OsString {
        std::env::join_paths(self.full_path()).unwrap_or_else(|_| {
            std::env::var_os("PATH").unwrap_or_default()
        })
    }

    /// Re-probe after an install may have changed things.
    pub fn refresh(&mut self) {
        *self = Self::run();
    }
}

fn locate_manager<F>(home: &Path, def: &ManagerDef, env_fn: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let from_env = def
        .env_var
        .and_then(|var| env_fn(var).ok())
        .map(PathBuf::from)
        .filter(|root| root.join(def.marker).exists());

    from_env.or_else(|| {
        let root = home.join(def.default_dir);
        root.join(def.marker).exists().then_some(root)
    })
}

/// `bin` directories of per-version installs, newest first.
fn version_bin_dirs(versions: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(versions) else {
        return Vec::new();
    };

    let mut installs: Vec<(super::version::Version, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let version = super::version::Version::extract(&name)?;
            let bin = [entry.path().join("bin"), entry.path().join("installation/bin")]
                .into_iter()
                .find(|p| p.is_dir())?;
            Some((version, bin))
        })
        .collect();

    installs.sort_by(|a, b| b.0.cmp(&a.0));
    installs.into_iter().map(|(_, bin)| bin).collect()
}
