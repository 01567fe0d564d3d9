//! Contract between the control plane and hot-swappable runtime modules.
//!
//! A module artifact is a `cdylib` exporting [`MODULE_ENTRY_SYMBOL`], a
//! function returning a [`ModuleDecl`] whose `api_version` must match
//! [`MODULE_API_VERSION`] exactly. The declaration lists the module
//! candidates the artifact contains; the reload coordinator picks one,
//! instantiates it and drives it through the lifecycle below.
//!
//! Host and module are built by the same toolchain, so the boundary uses
//! plain Rust types rather than a C ABI; the version gate is what catches a
//! stale artifact.

use tickbridge_core::{ControlRequest, ControlResponse};
use tickbridge_host::CapabilityAdapter;

// Single in-development ABI version. Bump on any change to the types below.
pub const MODULE_API_VERSION: u32 = 1;
pub const MODULE_ENTRY_SYMBOL: &str = "tickbridge_module_entry";

/// What a runtime module is allowed to see of its host: the notification
/// sink and the capability adapter. Handed to every lifecycle call; modules
/// must not retain it.
pub trait ModuleHost {
    fn publish_info(&mut self, text: &str);
    fn publish_success(&mut self, text: &str);
    fn publish_error(&mut self, text: &str);
    fn adapter(&mut self) -> &mut CapabilityAdapter;
}

/// The hot-swappable unit of decision logic. Exactly one instance is active
/// at a time; all calls happen on the host's mutation thread.
pub trait RuntimeModule: Send {
    /// Stable human-readable id, surfaced in reload notifications.
    fn runtime_id(&self) -> &str;

    fn on_attach(&mut self, _host: &mut dyn ModuleHost) {}

    fn on_detach(&mut self, _host: &mut dyn ModuleHost) {}

    fn on_tick(&mut self, _host: &mut dyn ModuleHost) {}

    fn on_config_reload(&mut self, _host: &mut dyn ModuleHost) {}

    /// Returns true when the module consumed the trigger.
    fn handle_trigger(&mut self, _host: &mut dyn ModuleHost) -> bool {
        false
    }

    /// Offered requests the server's fixed route table did not match.
    /// `None` means "not handled" and falls through to 404.
    fn handle_request(
        &mut self,
        _host: &mut dyn ModuleHost,
        _request: &ControlRequest,
    ) -> Option<ControlResponse> {
        None
    }
}

pub type ModuleCtor = fn() -> Box<dyn RuntimeModule>;

/// One instantiable module inside an artifact.
#[derive(Clone, Copy)]
pub struct ModuleCandidate {
    pub id: &'static str,
    pub ctor: ModuleCtor,
}

/// Root declaration returned by the entry symbol.
pub struct ModuleDecl {
    pub api_version: u32,
    pub candidates: fn() -> Vec<ModuleCandidate>,
}

/// Signature of the exported entry function.
pub type ModuleEntryFn = unsafe extern "Rust" fn() -> *const ModuleDecl;

/// Exports the entry symbol for an artifact crate.
///
/// ```ignore
/// declare_module!(candidates);
///
/// fn candidates() -> Vec<ModuleCandidate> {
///     vec![ModuleCandidate { id: "my-module-v1", ctor: || Box::new(MyModule::default()) }]
/// }
/// ```
#[macro_export]
macro_rules! declare_module {
    ($candidates:path) => {
        #[unsafe(no_mangle)]
        pub extern "Rust" fn tickbridge_module_entry() -> *const $crate::ModuleDecl {
            static DECL: $crate::ModuleDecl = $crate::ModuleDecl {
                api_version: $crate::MODULE_API_VERSION,
                candidates: $candidates,
            };
            &DECL
        }
    };
}
