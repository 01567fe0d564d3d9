use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result, anyhow};
use libloading::{Library, Symbol};
use tickbridge_core::{ControlPlaneConfig, Error};
use tickbridge_module_api::{
    MODULE_API_VERSION, MODULE_ENTRY_SYMBOL, ModuleCandidate, ModuleEntryFn, ModuleHost,
    RuntimeModule,
};
use tracing::{debug, info, warn};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(200);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Result of loading one module artifact: the candidates it declares, plus
/// the backing library when the artifact came off disk. The library must
/// outlive every candidate constructor and module instance.
pub struct LoadedArtifact {
    candidates: Vec<ModuleCandidate>,
    library: Option<Library>,
}

impl LoadedArtifact {
    pub fn new(candidates: Vec<ModuleCandidate>) -> Self {
        Self {
            candidates,
            library: None,
        }
    }

    pub fn with_library(candidates: Vec<ModuleCandidate>, library: Library) -> Self {
        Self {
            candidates,
            library: Some(library),
        }
    }

    fn into_parts(self) -> (Vec<ModuleCandidate>, Option<Library>) {
        (self.candidates, self.library)
    }
}

/// Seam between the coordinator and the artifact format; tests substitute
/// in-process loaders.
pub trait ModuleLoader: Send {
    fn load(&mut self, path: &Path) -> Result<LoadedArtifact>;
}

/// Production loader: a `cdylib` exporting the versioned entry symbol.
#[derive(Default)]
pub struct LibraryLoader;

impl ModuleLoader for LibraryLoader {
    fn load(&mut self, path: &Path) -> Result<LoadedArtifact> {
        // SAFETY: loading and calling a foreign artifact entrypoint is
        // inherently unsafe; the api_version gate below rejects stale builds.
        let library = unsafe { Library::new(path) }
            .with_context(|| format!("failed to load module artifact {}", path.display()))?;

        let candidates = {
            // SAFETY: symbol type matches the declared entry contract.
            let entry: Symbol<'_, ModuleEntryFn> = unsafe {
                library.get(MODULE_ENTRY_SYMBOL.as_bytes()).with_context(|| {
                    format!(
                        "missing entry symbol `{MODULE_ENTRY_SYMBOL}` in {}",
                        path.display()
                    )
                })?
            };
            // SAFETY: the entry function returns a pointer to a static decl
            // inside the library; null-checked before dereference.
            let decl = unsafe { (entry)() };
            if decl.is_null() {
                return Err(anyhow!("artifact returned a null module declaration"));
            }
            // SAFETY: non-null and valid while the library stays loaded.
            let decl = unsafe { &*decl };
            if decl.api_version != MODULE_API_VERSION {
                return Err(anyhow!(
                    "artifact api_version mismatch: artifact={}, host={MODULE_API_VERSION}",
                    decl.api_version
                ));
            }
            (decl.candidates)()
        };

        if candidates.is_empty() {
            return Err(anyhow!(
                "artifact declares no runtime module: {}",
                path.display()
            ));
        }
        Ok(LoadedArtifact::with_library(candidates, library))
    }
}

/// The currently attached module. Field order keeps the library alive until
/// the module instance has been dropped.
pub struct ActiveModule {
    module: Box<dyn RuntimeModule>,
    runtime_id: String,
    _library: Option<Library>,
}

impl ActiveModule {
    pub fn runtime_id(&self) -> &str {
        &self.runtime_id
    }
}

/// Polls the artifact for changes and swaps the active module, degrading to
/// the last known good module on any failure.
pub struct ReloadCoordinator {
    loader: Box<dyn ModuleLoader>,
    loaded_path: Option<PathBuf>,
    loaded_mtime: Option<SystemTime>,
    next_check_at: Option<Instant>,
    missing_logged: bool,
    active: Option<ActiveModule>,
}

impl ReloadCoordinator {
    pub fn new(loader: Box<dyn ModuleLoader>) -> Self {
        Self {
            loader,
            loaded_path: None,
            loaded_mtime: None,
            next_check_at: None,
            missing_logged: false,
            active: None,
        }
    }

    pub fn active(&self) -> Option<&ActiveModule> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Box<dyn RuntimeModule>> {
        self.active.as_mut().map(|active| &mut active.module)
    }

    pub fn active_runtime_id(&self) -> Option<&str> {
        self.active.as_ref().map(ActiveModule::runtime_id)
    }

    /// Called once per host tick. A no-op until the poll interval elapses,
    /// unless `force` is set.
    pub fn poll(&mut self, config: &ControlPlaneConfig, ctx: &mut dyn ModuleHost, force: bool) {
        let interval = config
            .reload_interval
            .clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);
        let now = Instant::now();
        if !force && self.next_check_at.is_some_and(|at| now < at) {
            return;
        }
        self.next_check_at = Some(now + interval);

        let path = config.resolved_artifact_path();
        let mtime = match std::fs::metadata(&path).and_then(|meta| meta.modified()) {
            Ok(mtime) => mtime,
            Err(_) => {
                if !self.missing_logged {
                    warn!(path = %path.display(), "module artifact not found");
                    self.missing_logged = true;
                }
                return;
            }
        };
        self.missing_logged = false;

        if !force
            && self.loaded_path.as_deref() == Some(path.as_path())
            && self.loaded_mtime == Some(mtime)
        {
            return;
        }

        match self.try_swap(&path, ctx) {
            Ok(runtime_id) => {
                // The stamp moves only after a successful attach, so a failed
                // reload is retried on the next poll.
                self.loaded_path = Some(path.clone());
                self.loaded_mtime = Some(mtime);
                info!(runtime_id, path = %path.display(), "runtime module reloaded");
                ctx.publish_success(&format!("runtime module reloaded: {runtime_id}"));
            }
            Err(error) => {
                let reported = Error::reload_failed(format!("{error:#}"));
                warn!(path = %path.display(), "{reported}");
                ctx.publish_error(&reported.to_string());
            }
        }
    }

    fn try_swap(&mut self, path: &Path, ctx: &mut dyn ModuleHost) -> Result<String> {
        let (mut candidates, library) = self.loader.load(path)?.into_parts();

        // Deterministic tie-break when an artifact declares several modules.
        candidates.sort_by(|a, b| a.id.cmp(b.id));
        let chosen = candidates
            .first()
            .copied()
            .ok_or_else(|| anyhow!("artifact declares no runtime module"))?;
        if candidates.len() > 1 {
            debug!(
                chosen = chosen.id,
                declared = candidates.len(),
                "multiple module candidates, taking lexicographically first"
            );
        }

        let module = catch_unwind(AssertUnwindSafe(chosen.ctor))
            .map_err(|_| anyhow!("module `{}` panicked during construction", chosen.id))?;
        let runtime_id = match module.runtime_id().trim() {
            "" => chosen.id.to_string(),
            id => id.to_string(),
        };
        let mut next = ActiveModule {
            module,
            runtime_id: runtime_id.clone(),
            _library: library,
        };

        if let Some(previous) = self.active.as_mut() {
            let detached =
                catch_unwind(AssertUnwindSafe(|| previous.module.on_detach(ctx)));
            if detached.is_err() {
                warn!(
                    runtime_id = previous.runtime_id.as_str(),
                    "previous module panicked in on_detach; swap proceeds"
                );
            }
        }

        catch_unwind(AssertUnwindSafe(|| next.module.on_attach(ctx)))
            .map_err(|_| anyhow!("module `{runtime_id}` panicked during attach"))?;

        self.active = Some(next);
        Ok(runtime_id)
    }
}
