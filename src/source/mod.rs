//! Source acquisition.
//!
//! Obtains the target application's source tree for a requested ref and
//! places it at an instance's birth path. Source is first staged in a
//! temporary directory, by `git clone` when git is usable and allowed, or
//! by downloading and extracting the ref's zip archive otherwise, then
//! copied into place.

pub mod archive;
pub mod git;
pub mod http;
pub mod transfer;

pub use git::GitClient;
pub use http::HttpFetcher;
pub use transfer::{partial_path, transfer_to_birth_path};

use crate::config::{Settings, TargetProfile};
use crate::error::{BroodError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Which ref of the target to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// A release tag.
    Tag(String),
    /// The configured development branch.
    Develop,
    /// The repository's default branch.
    Default,
}

impl SourceRef {
    /// A tag wins over the develop branch, which wins over the default.
    pub fn select(version: Option<&str>, develop: bool) -> Self {
        match version {
            Some(tag) if !tag.trim().is_empty() => SourceRef::Tag(tag.trim().to_string()),
            _ if develop => SourceRef::Develop,
            _ => SourceRef::Default,
        }
    }

    /// Ref to check out after cloning. `None` keeps the clone's HEAD.
    pub fn checkout_ref<'a>(&'a self, target: &'a TargetProfile) -> Option<&'a str> {
        match self {
            SourceRef::Tag(tag) => Some(tag),
            SourceRef::Develop => Some(&target.develop_branch),
            SourceRef::Default => None,
        }
    }

    /// Ref whose archive is downloaded.
    pub fn archive_ref<'a>(&'a self, target: &'a TargetProfile) -> &'a str {
        match self {
            SourceRef::Tag(tag) => tag,
            SourceRef::Develop => &target.develop_branch,
            SourceRef::Default => &target.default_branch,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Tag(tag) => write!(f, "tag {}", tag),
            SourceRef::Develop => write!(f, "develop branch"),
            SourceRef::Default => write!(f, "default branch"),
        }
    }
}

/// How source is obtained. Chosen once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStrategy {
    Clone,
    Download,
}

impl AcquisitionStrategy {
    /// Clone only when git is present and the caller allows it.
    pub fn select(git_available: bool, allow_git: bool) -> Self {
        if git_available && allow_git {
            AcquisitionStrategy::Clone
        } else {
            AcquisitionStrategy::Download
        }
    }
}

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub reference: SourceRef,
    pub allow_git: bool,
}

/// A temporary directory that is removed when dropped.
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("brood-stage-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Source tree staged for transfer. Dropping it removes the staging area.
pub struct StagedSource {
    staging: StagingArea,
    root: PathBuf,
    strategy: AcquisitionStrategy,
}

impl StagedSource {
    pub fn new(staging: StagingArea, root: PathBuf, strategy: AcquisitionStrategy) -> Self {
        Self {
            staging,
            root,
            strategy,
        }
    }

    /// Top of the staged source tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn strategy(&self) -> AcquisitionStrategy {
        self.strategy
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }
}

/// Produces staged source trees.
pub trait SourceProvider {
    fn fetch(&self, request: &SourceRequest) -> Result<StagedSource>;
}

/// Fetch source and copy it to `destination`.
pub fn install_source(
    provider: &dyn SourceProvider,
    request: &SourceRequest,
    destination: &Path,
) -> Result<AcquisitionStrategy> {
    let staged = provider.fetch(request)?;
    transfer_to_birth_path(staged.root(), destination)?;
    Ok(staged.strategy())
}

/// Fetches the configured target by clone or archive download.
pub struct SourceAcquisition {
    target: TargetProfile,
    git: GitClient,
    http: HttpFetcher,
}

impl SourceAcquisition {
    pub fn new(target: TargetProfile, git: GitClient, http: HttpFetcher) -> Self {
        Self { target, git, http }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = HttpFetcher::with_timeout(settings.timeouts.download())?;
        Ok(Self::new(
            settings.target.clone(),
            GitClient::new(settings.timeouts.git()),
            http,
        ))
    }

    fn clone_into(&self, staging: &StagingArea, reference: &SourceRef) -> Result<PathBuf> {
        let url = self.target.require_repository_url()?;
        let dest = staging.path().join(&self.target.tool_name);

        self.git
            .clone_repo(url, &dest)
            .map_err(|source| BroodError::SourceUnavailable { source })?;
        if let Some(git_ref) = reference.checkout_ref(&self.target) {
            self.git
                .checkout(&dest, git_ref)
                .map_err(|source| BroodError::SourceUnavailable { source })?;
        }

        Ok(dest)
    }

    fn download_into(&self, staging: &StagingArea, reference: &SourceRef) -> Result<PathBuf> {
        let base = self
            .target
            .archive_base()
            .ok_or_else(|| BroodError::ConfigValidationError {
                message: "target.repository_url or target.archive_base_url must be set"
                    .to_string(),
            })?;
        let git_ref = reference.archive_ref(&self.target);
        let url = format!("{}/{}.zip", base, git_ref);
        let archive_path = staging.path().join(format!("{}.zip", sanitize(git_ref)));
        let extracted = staging.path().join("extracted");

        let root = (|| -> anyhow::Result<PathBuf> {
            self.http.download_to(&url, &archive_path)?;
            archive::extract_zip(&archive_path, &extracted)?;
            archive::source_root(
                &extracted,
                &format!("{}-{}", self.target.tool_name, sanitize(git_ref)),
            )
        })()
        .map_err(|source| BroodError::SourceUnavailable { source })?;

        Ok(root)
    }
}

impl SourceProvider for SourceAcquisition {
    fn fetch(&self, request: &SourceRequest) -> Result<StagedSource> {
        let git_available = request.allow_git && self.git.is_available();
        let strategy = AcquisitionStrategy::select(git_available, request.allow_git);
        tracing::info!("Fetching {} ({:?})", request.reference, strategy);

        let staging = StagingArea::create()?;
        let root = match strategy {
            AcquisitionStrategy::Clone => self.clone_into(&staging, &request.reference)?,
            AcquisitionStrategy::Download => self.download_into(&staging, &request.reference)?,
        };

        Ok(StagedSource::new(staging, root, strategy))
    }
}

/// Branch names may contain `/`, which archive hosts replace with `-`.
fn sanitize(git_ref: &str) -> String {
    git_ref.replace('/', "-")
}
