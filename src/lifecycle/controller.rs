//! The instance lifecycle controller.
//!
//! Creation is strictly ordered: name and path are validated before any
//! requirement check, requirements are met before source is fetched,
//! source is in place before the instance is registered, and the instance
//! is registered before it is configured. Each call either completes or
//! stops at the first failing step with that step's error.

use crate::config::{Settings, TargetProfile};
use crate::error::{BroodError, Result};
use crate::registry::{Instance, InstanceMode, InstanceRegistry};
use crate::requirements::{HostRequirements, RequirementGate};
use crate::source::{install_source, SourceAcquisition, SourceProvider, SourceRef, SourceRequest};
use crate::ui::UserInterface;
use std::fs;
use std::path::{Path, PathBuf};

use super::container::ContainerStrategy;
use super::health::{Endpoint, HealthProbe};
use super::manifest;
use super::native::NativeStrategy;
use super::rollback::CreationRollback;
use super::status::{self, InstanceStatus};
use super::strategy::{ExecutionStrategy, LaunchRecord};

/// Options for [`LifecycleController::create_birth`].
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Instance name; generated as `<tool>-<n>` when absent.
    pub name: Option<String>,
    /// Birth path; `<instances dir>/<name>` when absent.
    pub path: Option<PathBuf>,
    /// Release tag to fetch.
    pub version: Option<String>,
    /// Fetch the development branch.
    pub develop: bool,
    pub containerized: bool,
    /// Allow `git clone`; archive download otherwise.
    pub use_git: bool,
    /// Ask before installing requirements.
    pub interactive: bool,
    /// Leave the directory and record in place when configure fails.
    pub keep_on_failure: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            name: None,
            path: None,
            version: None,
            develop: false,
            containerized: false,
            use_git: true,
            interactive: false,
            keep_on_failure: false,
        }
    }
}

/// Options for [`LifecycleController::update`].
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub version: Option<String>,
    pub develop: bool,
    pub use_git: bool,
    pub interactive: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            version: None,
            develop: false,
            use_git: true,
            interactive: false,
        }
    }
}

/// Creates, updates, starts, checks and runs instances.
pub struct LifecycleController {
    target: TargetProfile,
    instances_dir: PathBuf,
    cwd: PathBuf,
    registry: InstanceRegistry,
    source: Box<dyn SourceProvider>,
    requirements: Box<dyn RequirementGate>,
    native: Box<dyn ExecutionStrategy>,
    container: Box<dyn ExecutionStrategy>,
    health: HealthProbe,
}

impl LifecycleController {
    /// A controller wired to the real host: git/HTTP source, shell
    /// requirement installs, native processes and docker.
    pub fn new(
        settings: &Settings,
        home: &Path,
        cwd: &Path,
        registry: InstanceRegistry,
    ) -> Result<Self> {
        Ok(Self {
            target: settings.target.clone(),
            instances_dir: settings.instances_dir(home),
            cwd: cwd.to_path_buf(),
            registry,
            source: Box::new(SourceAcquisition::from_settings(settings)?),
            requirements: Box::new(HostRequirements::from_settings(settings)?),
            native: Box::new(NativeStrategy::new(&settings.target, &settings.timeouts)),
            container: Box::new(ContainerStrategy::new(&settings.target, &settings.timeouts)),
            health: HealthProbe::from_timeouts(&settings.timeouts),
        })
    }

    pub fn with_source(mut self, source: Box<dyn SourceProvider>) -> Self {
        self.source = source;
        self
    }

    pub fn with_requirements(mut self, requirements: Box<dyn RequirementGate>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Replace the strategy for the mode it reports.
    pub fn with_strategy(mut self, strategy: Box<dyn ExecutionStrategy>) -> Self {
        match strategy.mode() {
            InstanceMode::Native => self.native = strategy,
            InstanceMode::Containerized => self.container = strategy,
        }
        self
    }

    pub fn with_health(mut self, health: HealthProbe) -> Self {
        self.health = health;
        self
    }

    pub fn registry(&mut self) -> &mut InstanceRegistry {
        &mut self.registry
    }

    /// Create, place, register and configure a new instance.
    pub fn create_birth(
        &mut self,
        options: &CreateOptions,
        ui: &mut dyn UserInterface,
    ) -> Result<Instance> {
        let reuse_cwd = options.path.is_none()
            && options.version.is_none()
            && !options.develop
            && manifest::is_target_checkout(&self.cwd, &self.target);

        let name = match &options.name {
            Some(name) => validate_name(name)?,
            None => {
                // A directory left behind by `remove` still claims its name.
                let instances_dir = &self.instances_dir;
                self.registry
                    .next_free_name_where(&self.target.tool_name, |candidate| {
                        instances_dir.join(candidate).exists()
                    })?
            }
        };

        let path = if reuse_cwd {
            self.cwd.clone()
        } else {
            match &options.path {
                Some(path) => absolute(&self.cwd, path),
                None => self.instances_dir.join(&name),
            }
        };

        if !reuse_cwd && path.exists() {
            return Err(BroodError::PathExists { path });
        }
        if self.registry.find_by_name(&name)?.is_some() {
            return Err(BroodError::InstanceExists { name });
        }

        let mode = if options.containerized {
            InstanceMode::Containerized
        } else {
            InstanceMode::Native
        };
        if mode == InstanceMode::Native {
            self.requirements.ensure(ui, options.interactive)?;
        }

        let mut rollback = CreationRollback::new(&name);
        if options.keep_on_failure {
            rollback = rollback.disabled();
        }

        if reuse_cwd {
            ui.message(&format!(
                "Using the existing checkout in {}",
                path.display()
            ));
        } else {
            let request = SourceRequest {
                reference: SourceRef::select(options.version.as_deref(), options.develop),
                allow_git: options.use_git,
            };
            self.place_source(&request, &path, ui)?;
            rollback.track_dir_created(&path);
        }

        let mut instance = Instance::new(&name, &path, mode);
        if reuse_cwd {
            instance = instance.adopted();
        }
        if let Err(e) = self.registry.add(instance.clone()) {
            rollback.rollback(&mut self.registry);
            return Err(e);
        }
        rollback.track_registered();
        tracing::info!("Registered '{}' at {}", name, path.display());

        if let Err(e) = self.strategy(mode).configure(&instance, ui) {
            rollback.rollback(&mut self.registry);
            return Err(e);
        }

        Ok(instance)
    }

    /// Re-fetch an instance's source into its path and configure it again.
    ///
    /// The new tree is copied over the old one, so files removed upstream
    /// stay behind. Adopted checkouts are refused.
    pub fn update(
        &mut self,
        name: &str,
        options: &UpdateOptions,
        ui: &mut dyn UserInterface,
    ) -> Result<Instance> {
        let instance = self.registry.get(name)?;
        if instance.adopted {
            return Err(BroodError::ConfigValidationError {
                message: format!(
                    "'{}' is an existing checkout at {}; update it with git instead",
                    instance.name,
                    instance.path.display()
                ),
            });
        }

        if instance.mode == InstanceMode::Native {
            self.requirements.ensure(ui, options.interactive)?;
        }

        let request = SourceRequest {
            reference: SourceRef::select(options.version.as_deref(), options.develop),
            allow_git: options.use_git,
        };
        self.place_source(&request, &instance.path, ui)?;
        self.strategy(instance.mode).configure(&instance, ui)?;

        Ok(instance)
    }

    /// Launch a registered instance.
    pub fn start(
        &mut self,
        name: &str,
        port: Option<u16>,
        ui: &mut dyn UserInterface,
    ) -> Result<LaunchRecord> {
        let instance = self.registry.get(name)?;
        if !instance.path.is_dir() {
            return Err(BroodError::StartFailed {
                instance: instance.name.clone(),
                message: format!("{} does not exist", instance.path.display()),
            });
        }

        let strategy = self.strategy(instance.mode);
        if let Some(existing) = LaunchRecord::load(&instance.path)? {
            if strategy.is_running(&instance, &existing) {
                return Err(BroodError::StartFailed {
                    instance: instance.name.clone(),
                    message: format!("already running on port {}", existing.port),
                });
            }
        }

        let port = port.unwrap_or(self.target.default_port);
        let launch = strategy.start(&instance, port)?;
        launch.save(&instance.path)?;
        ui.success(&format!("Started {} on port {}", instance.name, port));

        Ok(launch)
    }

    /// Whether a registered instance answers within the health timeout.
    ///
    /// The port is, in order: `port`, the one it was last started on, the
    /// configured default.
    pub fn check(&mut self, name: &str, port: Option<u16>) -> Result<bool> {
        let instance = self.registry.get(name)?;
        let endpoint = self.endpoint_for(&instance, port)?;
        tracing::debug!("Probing {} for '{}'", endpoint, instance.name);
        Ok(self.health.wait_until_healthy(&endpoint))
    }

    /// Start, then require the instance to become healthy.
    pub fn run(
        &mut self,
        name: &str,
        port: Option<u16>,
        ui: &mut dyn UserInterface,
    ) -> Result<LaunchRecord> {
        let launch = self.start(name, port, ui)?;
        let endpoint = Endpoint::local(launch.port, self.target.health_path.as_deref());

        let mut spinner = ui.start_spinner(&format!("Waiting for {}", endpoint));
        if self.health.wait_until_healthy(&endpoint) {
            spinner.finish_success(&format!("{} is up at {}", name, endpoint));
            Ok(launch)
        } else {
            spinner.finish_error(&format!("{} did not answer", name));
            Err(BroodError::Unhealthy {
                instance: name.to_string(),
                endpoint: endpoint.to_string(),
                timeout: self.health.timeout(),
            })
        }
    }

    /// Stop a started instance and forget its launch record.
    pub fn stop(&mut self, name: &str) -> Result<()> {
        let instance = self.registry.get(name)?;
        let Some(launch) = LaunchRecord::load(&instance.path)? else {
            return Err(BroodError::NotStarted {
                instance: instance.name,
            });
        };

        let strategy = self.strategy(instance.mode);
        if strategy.is_running(&instance, &launch) {
            strategy.stop(&instance, &launch)?;
        }
        LaunchRecord::clear(&instance.path)?;
        Ok(())
    }

    pub fn status(&mut self, name: &str) -> Result<(Instance, InstanceStatus)> {
        let instance = self.registry.get(name)?;
        let status = status::probe(&instance, self.strategy(instance.mode));
        Ok((instance, status))
    }

    /// Every registered instance with its status.
    pub fn statuses(&mut self) -> Result<Vec<(Instance, InstanceStatus)>> {
        let instances = self.registry.list()?;
        Ok(instances
            .into_iter()
            .map(|instance| {
                let status = status::probe(&instance, self.strategy(instance.mode));
                (instance, status)
            })
            .collect())
    }

    /// Unregister an instance, stopping it first. With `purge`, its
    /// directory is deleted too.
    pub fn remove(
        &mut self,
        name: &str,
        purge: bool,
        ui: &mut dyn UserInterface,
    ) -> Result<Instance> {
        let instance = self.registry.get(name)?;

        if let Ok(Some(launch)) = LaunchRecord::load(&instance.path) {
            let strategy = self.strategy(instance.mode);
            if strategy.is_running(&instance, &launch) {
                if let Err(e) = strategy.stop(&instance, &launch) {
                    ui.warning(&format!("Could not stop {}: {}", instance.name, e));
                }
            }
        }

        let removed = self.registry.remove(name)?;

        if purge && removed.path.exists() {
            fs::remove_dir_all(&removed.path)?;
            tracing::info!("Deleted {}", removed.path.display());
        } else if removed.adopted || removed.path == self.cwd {
            ui.message(&format!(
                "Left the checkout in {} untouched",
                removed.path.display()
            ));
        }

        Ok(removed)
    }

    fn place_source(
        &self,
        request: &SourceRequest,
        path: &Path,
        ui: &mut dyn UserInterface,
    ) -> Result<()> {
        let mut spinner = ui.start_spinner(&format!("Fetching {}", request.reference));
        match install_source(self.source.as_ref(), request, path) {
            Ok(strategy) => {
                spinner.finish_success(&format!(
                    "Source placed at {} ({:?})",
                    path.display(),
                    strategy
                ));
                Ok(())
            }
            Err(e) => {
                spinner.finish_error("Could not obtain source");
                Err(e)
            }
        }
    }

    fn endpoint_for(&self, instance: &Instance, port: Option<u16>) -> Result<Endpoint> {
        let port = match port {
            Some(port) => port,
            None => LaunchRecord::load(&instance.path)?
                .map(|launch| launch.port)
                .unwrap_or(self.target.default_port),
        };
        Ok(Endpoint::local(port, self.target.health_path.as_deref()))
    }

    fn strategy(&self, mode: InstanceMode) -> &dyn ExecutionStrategy {
        match mode {
            InstanceMode::Native => self.native.as_ref(),
            InstanceMode::Containerized => self.container.as_ref(),
        }
    }
}

/// Instance names become directory and container names.
fn validate_name(name: &str) -> Result<String> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(name.to_string())
    } else {
        Err(BroodError::ConfigValidationError {
            message: format!(
                "invalid instance name '{}': use letters, digits, '-', '_' and '.'",
                name
            ),
        })
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{AcquisitionStrategy, StagedSource, StagingArea};
    use crate::ui::MockUI;
    use std::cell::{Cell, RefCell};
    use std::net::TcpListener;
    use std::rc::Rc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Calls {
        fetches: Cell<usize>,
        ensures: Cell<usize>,
        configures: Cell<usize>,
        starts: Cell<usize>,
        stops: Cell<usize>,
        requests: RefCell<Vec<SourceRequest>>,
    }

    struct FakeSource {
        calls: Rc<Calls>,
        fail: bool,
    }

    impl SourceProvider for FakeSource {
        fn fetch(&self, request: &SourceRequest) -> Result<StagedSource> {
            self.calls.fetches.set(self.calls.fetches.get() + 1);
            self.calls.requests.borrow_mut().push(request.clone());
            if self.fail {
                return Err(BroodError::SourceUnavailable {
                    source: anyhow::anyhow!("network down"),
                });
            }
            let staging = StagingArea::create()?;
            let root = staging.path().join("forge");
            fs::create_dir_all(&root)?;
            fs::write(root.join("package.json"), r#"{"name":"forge"}"#)?;
            Ok(StagedSource::new(staging, root, AcquisitionStrategy::Download))
        }
    }

    struct FakeGate {
        calls: Rc<Calls>,
        fail: bool,
    }

    impl RequirementGate for FakeGate {
        fn ensure(&mut self, _ui: &mut dyn UserInterface, _interactive: bool) -> Result<()> {
            self.calls.ensures.set(self.calls.ensures.get() + 1);
            if self.fail {
                Err(BroodError::RequirementMissing {
                    requirement: "node".into(),
                    message: "not found".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    struct FakeStrategy {
        mode: InstanceMode,
        calls: Rc<Calls>,
        fail_configure: bool,
        running: Cell<bool>,
    }

    impl ExecutionStrategy for FakeStrategy {
        fn mode(&self) -> InstanceMode {
            self.mode
        }

        fn configure(&self, instance: &Instance, _ui: &mut dyn UserInterface) -> Result<()> {
            self.calls.configures.set(self.calls.configures.get() + 1);
            if self.fail_configure {
                Err(BroodError::ConfigureFailed {
                    instance: instance.name.clone(),
                    message: "setup exploded".into(),
                })
            } else {
                Ok(())
            }
        }

        fn start(&self, _instance: &Instance, port: u16) -> Result<LaunchRecord> {
            self.calls.starts.set(self.calls.starts.get() + 1);
            self.running.set(true);
            Ok(LaunchRecord::process(4242, port))
        }

        fn is_running(&self, _instance: &Instance, _launch: &LaunchRecord) -> bool {
            self.running.get()
        }

        fn stop(&self, _instance: &Instance, _launch: &LaunchRecord) -> Result<()> {
            self.calls.stops.set(self.calls.stops.get() + 1);
            self.running.set(false);
            Ok(())
        }
    }

    struct Harness {
        temp: TempDir,
        calls: Rc<Calls>,
        controller: LifecycleController,
        ui: MockUI,
    }

    struct Faults {
        source: bool,
        gate: bool,
        configure: bool,
    }

    const NO_FAULTS: Faults = Faults {
        source: false,
        gate: false,
        configure: false,
    };

    fn harness(faults: Faults) -> Harness {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let cwd = temp.path().join("work");
        fs::create_dir_all(&cwd).unwrap();
        let calls = Rc::new(Calls::default());
        let settings = Settings {
            target: TargetProfile {
                tool_name: "forge".to_string(),
                archive_base_url: Some("http://127.0.0.1:1/archive".to_string()),
                manifest_homepage: Some("https://forge.example.invalid".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let strategy = |mode| FakeStrategy {
            mode,
            calls: Rc::clone(&calls),
            fail_configure: faults.configure,
            running: Cell::new(false),
        };

        let controller =
            LifecycleController::new(&settings, &home, &cwd, InstanceRegistry::in_memory())
                .unwrap()
                .with_source(Box::new(FakeSource {
                    calls: Rc::clone(&calls),
                    fail: faults.source,
                }))
                .with_requirements(Box::new(FakeGate {
                    calls: Rc::clone(&calls),
                    fail: faults.gate,
                }))
                .with_strategy(Box::new(strategy(InstanceMode::Native)))
                .with_strategy(Box::new(strategy(InstanceMode::Containerized)))
                .with_health(HealthProbe::new(
                    Duration::from_millis(400),
                    Duration::from_millis(50),
                ));

        Harness {
            temp,
            calls,
            controller,
            ui: MockUI::new(),
        }
    }

    const CHECKOUT_MANIFEST: &str =
        r#"{"name":"forge","homepage":"https://forge.example.invalid"}"#;

    fn named(name: &str) -> CreateOptions {
        CreateOptions {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn create_places_registers_and_configures() {
        let mut h = harness(NO_FAULTS);

        let instance = h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();

        assert_eq!(instance.path, h.temp.path().join("home/instances/alpha"));
        assert!(instance.path.join("package.json").is_file());
        assert_eq!(h.controller.registry().list().unwrap().len(), 1);
        assert_eq!(h.calls.fetches.get(), 1);
        assert_eq!(h.calls.ensures.get(), 1);
        assert_eq!(h.calls.configures.get(), 1);
    }

    #[test]
    fn duplicate_name_fails_without_touching_disk() {
        let mut h = harness(NO_FAULTS);
        h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();
        let other = h.temp.path().join("elsewhere");

        let err = h
            .controller
            .create_birth(
                &CreateOptions {
                    path: Some(other.clone()),
                    ..named("alpha")
                },
                &mut h.ui,
            )
            .unwrap_err();

        assert!(matches!(err, BroodError::InstanceExists { .. }));
        assert!(!other.exists());
        assert_eq!(h.calls.fetches.get(), 1);
        assert_eq!(h.calls.ensures.get(), 1);
    }

    #[test]
    fn existing_path_fails_before_requirements() {
        let mut h = harness(NO_FAULTS);
        let taken = h.temp.path().join("taken");
        fs::create_dir_all(&taken).unwrap();

        let err = h
            .controller
            .create_birth(
                &CreateOptions {
                    path: Some(taken),
                    ..named("alpha")
                },
                &mut h.ui,
            )
            .unwrap_err();

        assert!(matches!(err, BroodError::PathExists { .. }));
        assert_eq!(h.calls.ensures.get(), 0);
        assert_eq!(h.calls.fetches.get(), 0);
    }

    #[test]
    fn relative_path_resolves_against_cwd() {
        let mut h = harness(NO_FAULTS);

        let instance = h
            .controller
            .create_birth(
                &CreateOptions {
                    path: Some(PathBuf::from("sub/alpha")),
                    ..named("alpha")
                },
                &mut h.ui,
            )
            .unwrap();

        assert_eq!(instance.path, h.temp.path().join("work/sub/alpha"));
    }

    #[test]
    fn requirement_failure_stops_before_source() {
        let mut h = harness(Faults {
            gate: true,
            ..NO_FAULTS
        });

        let err = h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap_err();

        assert!(matches!(err, BroodError::RequirementMissing { .. }));
        assert_eq!(h.calls.fetches.get(), 0);
        assert!(h.controller.registry().list().unwrap().is_empty());
    }

    #[test]
    fn containerized_skips_requirements() {
        let mut h = harness(Faults {
            gate: true,
            ..NO_FAULTS
        });

        let instance = h
            .controller
            .create_birth(
                &CreateOptions {
                    containerized: true,
                    ..named("boxed")
                },
                &mut h.ui,
            )
            .unwrap();

        assert_eq!(instance.mode, InstanceMode::Containerized);
        assert_eq!(h.calls.ensures.get(), 0);
    }

    #[test]
    fn source_failure_leaves_nothing_behind() {
        let mut h = harness(Faults {
            source: true,
            ..NO_FAULTS
        });

        let err = h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap_err();

        assert!(matches!(err, BroodError::SourceUnavailable { .. }));
        assert!(!h.temp.path().join("home/instances/alpha").exists());
        assert!(h.controller.registry().list().unwrap().is_empty());
        assert_eq!(h.calls.configures.get(), 0);
    }

    #[test]
    fn configure_failure_rolls_back() {
        let mut h = harness(Faults {
            configure: true,
            ..NO_FAULTS
        });

        let err = h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap_err();

        assert!(matches!(err, BroodError::ConfigureFailed { .. }));
        assert!(!h.temp.path().join("home/instances/alpha").exists());
        assert!(h.controller.registry().list().unwrap().is_empty());
    }

    #[test]
    fn configure_failure_kept_on_request() {
        let mut h = harness(Faults {
            configure: true,
            ..NO_FAULTS
        });

        let result = h.controller.create_birth(
            &CreateOptions {
                keep_on_failure: true,
                ..named("alpha")
            },
            &mut h.ui,
        );

        assert!(result.is_err());
        assert!(h.temp.path().join("home/instances/alpha").exists());
        assert_eq!(h.controller.registry().list().unwrap().len(), 1);
    }

    #[test]
    fn generated_names_count_up() {
        let mut h = harness(NO_FAULTS);

        let first = h
            .controller
            .create_birth(&CreateOptions::default(), &mut h.ui)
            .unwrap();
        let second = h
            .controller
            .create_birth(&CreateOptions::default(), &mut h.ui)
            .unwrap();

        assert_eq!(first.name, "forge-1");
        assert_eq!(second.name, "forge-2");
    }

    #[test]
    fn generated_name_skips_directory_left_by_remove() {
        let mut h = harness(NO_FAULTS);
        let first = h
            .controller
            .create_birth(&CreateOptions::default(), &mut h.ui)
            .unwrap();
        h.controller.remove(&first.name, false, &mut h.ui).unwrap();
        assert!(first.path.exists());

        let second = h
            .controller
            .create_birth(&CreateOptions::default(), &mut h.ui)
            .unwrap();

        assert_eq!(first.name, "forge-1");
        assert_eq!(second.name, "forge-2");
        assert_eq!(h.controller.registry().list().unwrap().len(), 1);
    }

    #[test]
    fn checkout_in_cwd_is_reused() {
        let mut h = harness(NO_FAULTS);
        let cwd = h.temp.path().join("work");
        fs::write(cwd.join("package.json"), CHECKOUT_MANIFEST).unwrap();

        let instance = h.controller.create_birth(&named("local"), &mut h.ui).unwrap();

        assert_eq!(instance.path, cwd);
        assert!(instance.adopted);
        assert_eq!(h.calls.fetches.get(), 0);
        assert_eq!(h.calls.configures.get(), 1);
    }

    #[test]
    fn cwd_with_matching_name_only_is_not_reused() {
        let mut h = harness(NO_FAULTS);
        let cwd = h.temp.path().join("work");
        fs::write(cwd.join("package.json"), r#"{"name":"forge"}"#).unwrap();

        let instance = h.controller.create_birth(&named("fresh"), &mut h.ui).unwrap();

        assert_eq!(instance.path, h.temp.path().join("home/instances/fresh"));
        assert!(!instance.adopted);
        assert_eq!(h.calls.fetches.get(), 1);
        assert!(!cwd.join(".brood").exists());
    }

    #[test]
    fn update_refuses_adopted_checkout() {
        let mut h = harness(NO_FAULTS);
        let cwd = h.temp.path().join("work");
        fs::write(cwd.join("package.json"), CHECKOUT_MANIFEST).unwrap();
        h.controller.create_birth(&named("local"), &mut h.ui).unwrap();

        let err = h
            .controller
            .update("local", &UpdateOptions::default(), &mut h.ui)
            .unwrap_err();

        assert!(matches!(err, BroodError::ConfigValidationError { .. }));
        assert_eq!(h.calls.fetches.get(), 0);
        assert_eq!(h.calls.ensures.get(), 1);
        assert_eq!(
            fs::read_to_string(cwd.join("package.json")).unwrap(),
            CHECKOUT_MANIFEST
        );
    }

    #[test]
    fn explicit_version_ignores_cwd_checkout() {
        let mut h = harness(NO_FAULTS);
        fs::write(h.temp.path().join("work/package.json"), CHECKOUT_MANIFEST).unwrap();

        h.controller
            .create_birth(
                &CreateOptions {
                    version: Some("v1.0.0".into()),
                    develop: true,
                    ..named("tagged")
                },
                &mut h.ui,
            )
            .unwrap();

        assert_eq!(
            h.calls.requests.borrow()[0].reference,
            SourceRef::Tag("v1.0.0".into())
        );
    }

    #[test]
    fn invalid_names_are_rejected() {
        for bad in ["", ".hidden", "a/b", "with space"] {
            assert!(validate_name(bad).is_err(), "{bad:?} should be invalid");
        }
        assert!(validate_name("forge-1.2_x").is_ok());
    }

    #[test]
    fn update_refetches_and_reconfigures() {
        let mut h = harness(NO_FAULTS);
        let instance = h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();
        fs::write(instance.path.join("package.json"), "stale").unwrap();

        h.controller
            .update(
                "alpha",
                &UpdateOptions {
                    develop: true,
                    ..Default::default()
                },
                &mut h.ui,
            )
            .unwrap();

        assert_eq!(
            fs::read_to_string(instance.path.join("package.json")).unwrap(),
            r#"{"name":"forge"}"#
        );
        assert_eq!(h.calls.fetches.get(), 2);
        assert_eq!(h.calls.configures.get(), 2);
        assert_eq!(h.controller.registry().list().unwrap().len(), 1);
    }

    #[test]
    fn unknown_instance_is_not_found() {
        let mut h = harness(NO_FAULTS);

        assert!(matches!(
            h.controller.update("ghost", &UpdateOptions::default(), &mut h.ui),
            Err(BroodError::InstanceNotFound { .. })
        ));
        assert!(matches!(
            h.controller.start("ghost", None, &mut h.ui),
            Err(BroodError::InstanceNotFound { .. })
        ));
        assert!(matches!(
            h.controller.check("ghost", None),
            Err(BroodError::InstanceNotFound { .. })
        ));
    }

    #[test]
    fn start_saves_launch_record() {
        let mut h = harness(NO_FAULTS);
        let instance = h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();

        let launch = h.controller.start("alpha", Some(8123), &mut h.ui).unwrap();

        assert_eq!(launch.port, 8123);
        assert_eq!(
            LaunchRecord::load(&instance.path).unwrap().unwrap().port,
            8123
        );
        assert_eq!(
            h.controller.status("alpha").unwrap().1,
            InstanceStatus::Running { port: 8123 }
        );
    }

    #[test]
    fn second_start_while_running_fails() {
        let mut h = harness(NO_FAULTS);
        h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();
        h.controller.start("alpha", Some(8123), &mut h.ui).unwrap();

        let err = h.controller.start("alpha", Some(8123), &mut h.ui).unwrap_err();

        assert!(matches!(err, BroodError::StartFailed { .. }));
        assert_eq!(h.calls.starts.get(), 1);
    }

    #[test]
    fn run_with_nothing_listening_is_unhealthy() {
        let mut h = harness(NO_FAULTS);
        h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let started = Instant::now();

        let err = h.controller.run("alpha", Some(port), &mut h.ui).unwrap_err();

        assert!(matches!(err, BroodError::Unhealthy { .. }));
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[test]
    fn run_with_listener_succeeds() {
        let mut h = harness(NO_FAULTS);
        h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let launch = h.controller.run("alpha", Some(port), &mut h.ui).unwrap();

        assert_eq!(launch.port, port);
        assert!(h.controller.check("alpha", None).unwrap());
    }

    #[test]
    fn stop_clears_launch_record() {
        let mut h = harness(NO_FAULTS);
        let instance = h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();
        assert!(matches!(
            h.controller.stop("alpha"),
            Err(BroodError::NotStarted { .. })
        ));
        h.controller.start("alpha", None, &mut h.ui).unwrap();

        h.controller.stop("alpha").unwrap();

        assert_eq!(h.calls.stops.get(), 1);
        assert!(LaunchRecord::load(&instance.path).unwrap().is_none());
        assert_eq!(
            h.controller.status("alpha").unwrap().1,
            InstanceStatus::Created
        );
    }

    #[test]
    fn remove_with_purge_deletes_directory() {
        let mut h = harness(NO_FAULTS);
        let instance = h.controller.create_birth(&named("alpha"), &mut h.ui).unwrap();

        h.controller.remove("alpha", true, &mut h.ui).unwrap();

        assert!(!instance.path.exists());
        assert!(h.controller.registry().list().unwrap().is_empty());
    }

    #[test]
    fn remove_without_purge_keeps_cwd_checkout() {
        let mut h = harness(NO_FAULTS);
        let cwd = h.temp.path().join("work");
        fs::write(cwd.join("package.json"), CHECKOUT_MANIFEST).unwrap();
        h.controller.create_birth(&named("local"), &mut h.ui).unwrap();

        h.controller.remove("local", false, &mut h.ui).unwrap();

        assert!(cwd.join("package.json").exists());
        assert!(h.controller.registry().list().unwrap().is_empty());
        assert!(h.ui.has_message("untouched"));
    }

    #[test]
    fn statuses_cover_all_instances() {
        let mut h = harness(NO_FAULTS);
        let gone = h.controller.create_birth(&named("gone"), &mut h.ui).unwrap();
        h.controller.create_birth(&named("fresh"), &mut h.ui).unwrap();
        fs::remove_dir_all(&gone.path).unwrap();

        let statuses: Vec<_> = h
            .controller
            .statuses()
            .unwrap()
            .into_iter()
            .map(|(i, s)| (i.name, s))
            .collect();

        assert_eq!(
            statuses,
            vec![
                ("gone".to_string(), InstanceStatus::Absent),
                ("fresh".to_string(), InstanceStatus::Created),
            ]
        );
    }
}
