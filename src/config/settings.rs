//! Settings schema and loading.
//!
//! Settings live in `~/.brood/config.yml` (or `$BROOD_HOME/config.yml`).
//! Every field has a default, so a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BroodError, Result};

/// Environment variable that relocates the state directory.
pub const HOME_ENV: &str = "BROOD_HOME";

/// Name of the settings file inside the state directory.
pub const SETTINGS_FILE: &str = "config.yml";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The application brood provisions.
    pub target: TargetProfile,

    /// Native-mode requirements, checked before source acquisition.
    pub requirements: Vec<RequirementSpec>,

    /// Timeouts for external operations.
    pub timeouts: Timeouts,

    /// Parent directory for new instances (default: `<state dir>/instances`).
    pub instances_dir: Option<PathBuf>,
}

/// Description of the target application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetProfile {
    /// Short tool name, used for archive folder names and generated instance names.
    pub tool_name: String,

    /// Canonical git repository.
    pub repository_url: Option<String>,

    /// Base URL that `<ref>.zip` is appended to. Derived from
    /// `repository_url` when unset.
    pub archive_base_url: Option<String>,

    /// Branch checked out when `--develop` is given.
    pub develop_branch: String,

    /// Branch used when no version or develop branch is requested.
    pub default_branch: String,

    /// Manifest file read for current-directory detection.
    pub manifest_file: String,

    /// Declared `name` that identifies a checkout of the target.
    pub manifest_name: Option<String>,

    /// Declared `homepage` that identifies a checkout of the target.
    pub manifest_homepage: Option<String>,

    /// Native setup command, run inside the instance tree.
    pub setup_command: String,

    /// Native start command, run inside the instance tree.
    pub start_command: String,

    /// Prefix for container image and container names.
    pub image_prefix: String,

    /// Port the application listens on inside its container.
    pub container_port: u16,

    /// Port probed when none is given on the command line.
    pub default_port: u16,

    /// Optional HTTP path that must answer with a success status.
    pub health_path: Option<String>,
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self {
            tool_name: "app".to_string(),
            repository_url: None,
            archive_base_url: None,
            develop_branch: "develop".to_string(),
            default_branch: "main".to_string(),
            manifest_file: "package.json".to_string(),
            manifest_name: None,
            manifest_homepage: None,
            setup_command: "npm install".to_string(),
            start_command: "npm start".to_string(),
            image_prefix: "brood".to_string(),
            container_port: 3000,
            default_port: 3000,
            health_path: None,
        }
    }
}

impl TargetProfile {
    /// Repository URL, or a validation error naming the missing setting.
    pub fn require_repository_url(&self) -> Result<&str> {
        self.repository_url
            .as_deref()
            .ok_or_else(|| BroodError::ConfigValidationError {
                message: "target.repository_url is not set".to_string(),
            })
    }

    /// Archive base URL, explicit or derived from a GitHub-style repository URL.
    pub fn archive_base(&self) -> Option<String> {
        if let Some(base) = &self.archive_base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        self.repository_url.as_ref().map(|url| {
            let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
            format!("{}/archive", trimmed)
        })
    }

    /// Name expected in the manifest (defaults to the tool name).
    pub fn expected_manifest_name(&self) -> &str {
        self.manifest_name.as_deref().unwrap_or(&self.tool_name)
    }
}

/// Role of a requirement, which fixes its position in the check order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementRole {
    Interpreter,
    EnvironmentManager,
    #[default]
    PackageManager,
    Environment,
}

/// A requirement as written in the settings file.
///
/// Either `command` (a tool check) or `variable` (an environment check)
/// must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub name: String,

    #[serde(default)]
    pub role: RequirementRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_flag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,

    /// Shell command that installs the requirement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,

    /// Manual instructions shown when it cannot be installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl RequirementSpec {
    /// A tool requirement.
    pub fn tool(name: &str, role: RequirementRole, min_version: &str) -> Self {
        Self {
            name: name.to_string(),
            role,
            command: Some(name.to_string()),
            version_flag: None,
            min_version: Some(min_version.to_string()),
            variable: None,
            contains: None,
            install: None,
            hint: None,
        }
    }

    /// An environment variable requirement.
    pub fn env(variable: &str, contains: &str) -> Self {
        Self {
            name: variable.to_string(),
            role: RequirementRole::Environment,
            command: None,
            version_flag: None,
            min_version: None,
            variable: Some(variable.to_string()),
            contains: Some(contains.to_string()),
            install: None,
            hint: None,
        }
    }

    /// Set the install command.
    pub fn with_install(mut self, install: &str) -> Self {
        self.install = Some(install.to_string());
        self
    }

    /// Set the manual install hint.
    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }
}

/// Installs mise into `~/.local/bin` when it is not there yet.
const MISE_INSTALL: &str = "command -v mise >/dev/null || curl -fsSL https://mise.run | sh";


/// Requirements used when the settings file lists none.
///
/// Interpreter first, so the node install bootstraps mise itself rather
/// than relying on the environment manager check that follows it.
pub fn default_requirements() -> Vec<RequirementSpec> {
    vec![
        RequirementSpec::tool("node", RequirementRole::Interpreter, "18.0.0")
            .with_install(&format!(
                "{{ {}; }} && PATH=\"$HOME/.local/bin:$PATH\" mise use --global node@20",
                MISE_INSTALL
            ))
            .with_hint("Install Node.js 18 or newer"),
        RequirementSpec::tool("mise", RequirementRole::EnvironmentManager, "2024.1.0")
            .with_install(MISE_INSTALL)
            .with_hint("Install mise from https://mise.jdx.dev"),
        RequirementSpec::tool("npm", RequirementRole::PackageManager, "9.0.0")
            .with_install("npm install --global npm@latest")
            .with_hint("Install npm 9 or newer"),
    ]
}

/// Timeouts for external operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Version queries and other short commands.
    pub command_secs: u64,
    /// `git clone` and `git checkout`.
    pub clone_secs: u64,
    /// Archive download.
    pub download_secs: u64,
    /// Setup, install and image build commands.
    pub setup_secs: u64,
    /// Ceiling for the readiness probe.
    pub health_secs: u64,
    /// Delay between readiness attempts.
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_secs: 10,
            clone_secs: 600,
            download_secs: 300,
            setup_secs: 1800,
            health_secs: 60,
            poll_interval_ms: 500,
        }
    }
}

impl Timeouts {
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn git(&self) -> Duration {
        Duration::from_secs(self.clone_secs)
    }

    pub fn download(&self) -> Duration {
        Duration::from_secs(self.download_secs)
    }

    pub fn setup(&self) -> Duration {
        Duration::from_secs(self.setup_secs)
    }

    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Settings {
    /// Load settings from `<home>/config.yml`, falling back to defaults.
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        parse_settings(&content, &path)
    }

    /// Apply `BROOD_*` environment overrides.
    pub fn apply_env<F>(&mut self, env_fn: F)
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        if let Ok(dir) = env_fn("BROOD_INSTANCES_DIR") {
            self.instances_dir = Some(PathBuf::from(dir));
        }
        if let Ok(url) = env_fn("BROOD_REPOSITORY_URL") {
            self.target.repository_url = Some(url);
        }
        if let Ok(url) = env_fn("BROOD_ARCHIVE_URL") {
            self.target.archive_base_url = Some(url);
        }
        if let Ok(secs) = env_fn("BROOD_HEALTH_TIMEOUT") {
            match secs.parse() {
                Ok(secs) => self.timeouts.health_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid BROOD_HEALTH_TIMEOUT: {}", secs),
            }
        }
    }

    /// Requirements to check, in check order (interpreter first,
    /// environment variables last).
    pub fn effective_requirements(&self) -> Vec<RequirementSpec> {
        let mut specs = if self.requirements.is_empty() {
            default_requirements()
        } else {
            self.requirements.clone()
        };
        specs.sort_by_key(|spec| spec.role);
        specs
    }

    /// Directory that holds new instances.
    pub fn instances_dir(&self, home: &Path) -> PathBuf {
        self.instances_dir
            .clone()
            .unwrap_or_else(|| home.join("instances"))
    }
}

/// Parse YAML content into settings.
pub fn parse_settings(content: &str, source_path: &Path) -> Result<Settings> {
    serde_yaml::from_str(content).map_err(|e| BroodError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// The state directory: `$BROOD_HOME`, else `~/.brood`.
pub fn state_home() -> PathBuf {
    match std::env::var(HOME_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(".brood"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(temp.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn parses_partial_settings() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(SETTINGS_FILE),
            r#"
target:
  tool_name: forge
  repository_url: https://github.com/acme/forge.git
  default_port: 8080
timeouts:
  health_secs: 5
"#,
        )
        .unwrap();

        let settings = Settings::load(temp.path()).unwrap();
        assert_eq!(settings.target.tool_name, "forge");
        assert_eq!(settings.target.default_port, 8080);
        assert_eq!(settings.target.develop_branch, "develop");
        assert_eq!(settings.timeouts.health_secs, 5);
        assert_eq!(settings.timeouts.poll_interval_ms, 500);
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "target: [unclosed").unwrap();

        let err = Settings::load(temp.path()).unwrap_err();
        assert!(matches!(err, BroodError::ConfigParseError { .. }));
    }

    #[test]
    fn archive_base_derived_from_repository() {
        let target = TargetProfile {
            repository_url: Some("https://github.com/acme/forge.git".to_string()),
            ..Default::default()
        };
        assert_eq!(
            target.archive_base().as_deref(),
            Some("https://github.com/acme/forge/archive")
        );
    }

    #[test]
    fn explicit_archive_base_wins() {
        let target = TargetProfile {
            repository_url: Some("https://github.com/acme/forge.git".to_string()),
            archive_base_url: Some("https://mirror.local/forge/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            target.archive_base().as_deref(),
            Some("https://mirror.local/forge")
        );
    }

    #[test]
    fn missing_repository_is_validation_error() {
        let target = TargetProfile::default();
        assert!(matches!(
            target.require_repository_url(),
            Err(BroodError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut settings = Settings::default();
        settings.apply_env(|key| match key {
            "BROOD_REPOSITORY_URL" => Ok("https://example.invalid/repo.git".to_string()),
            "BROOD_HEALTH_TIMEOUT" => Ok("7".to_string()),
            _ => Err(std::env::VarError::NotPresent),
        });
        assert_eq!(
            settings.target.repository_url.as_deref(),
            Some("https://example.invalid/repo.git")
        );
        assert_eq!(settings.timeouts.health_secs, 7);
        assert!(settings.instances_dir.is_none());
    }

    #[test]
    fn invalid_health_timeout_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(|key| match key {
            "BROOD_HEALTH_TIMEOUT" => Ok("soon".to_string()),
            _ => Err(std::env::VarError::NotPresent),
        });
        assert_eq!(settings.timeouts.health_secs, 60);
    }

    #[test]
    fn requirements_sorted_by_role() {
        let settings = Settings {
            requirements: vec![
                RequirementSpec::env("NODE_OPTIONS", "--max-old-space-size"),
                RequirementSpec::tool("pnpm", RequirementRole::PackageManager, "8"),
                RequirementSpec::tool("nvm", RequirementRole::EnvironmentManager, "0.39"),
                RequirementSpec::tool("node", RequirementRole::Interpreter, "18"),
            ],
            ..Default::default()
        };

        let names: Vec<_> = settings
            .effective_requirements()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["node", "nvm", "pnpm", "NODE_OPTIONS"]);
    }

    #[test]
    fn default_requirements_used_when_none_listed() {
        let settings = Settings::default();
        let names: Vec<_> = settings
            .effective_requirements()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["node", "mise", "npm"]);
    }

    #[test]
    fn node_install_bootstraps_mise() {
        let requirements = default_requirements();
        let node = requirements.iter().find(|r| r.name == "node").unwrap();
        let mise = requirements.iter().find(|r| r.name == "mise").unwrap();

        assert_eq!(mise.role, RequirementRole::EnvironmentManager);
        let mise_install = mise.install.as_deref().unwrap();
        assert!(node.install.as_deref().unwrap().contains(mise_install));
    }

    #[test]
    fn instances_dir_defaults_under_home() {
        let settings = Settings::default();
        assert_eq!(
            settings.instances_dir(Path::new("/state")),
            PathBuf::from("/state/instances")
        );
    }
}
