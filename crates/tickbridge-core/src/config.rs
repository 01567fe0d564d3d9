use std::path::PathBuf;
use std::time::Duration;

/// Control-plane configuration. The embedder fills this in and hands it to
/// the controller at startup; parsing a config file is the host's business.
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub server_enabled: bool,
    pub server_host: String,
    pub server_port: u16,
    /// Path of the loadable module artifact. Relative paths are resolved
    /// against `root_dir`.
    pub module_artifact_path: Option<PathBuf>,
    /// Directory the default artifact path and relative paths hang off.
    pub root_dir: PathBuf,
    /// Clamped to 0.2s..=30s at the poll site.
    pub reload_interval: Duration,
    /// Bound on the synchronous "ask the host thread" read path.
    pub host_query_timeout: Duration,
    /// Module preferred when several host modules register the same type name.
    pub primary_host_module: String,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            server_enabled: true,
            server_host: "127.0.0.1".to_string(),
            server_port: 8766,
            module_artifact_path: None,
            root_dir: PathBuf::from("."),
            reload_interval: Duration::from_secs(1),
            host_query_timeout: Duration::from_millis(250),
            primary_host_module: "sim".to_string(),
        }
    }
}

impl ControlPlaneConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Resolves the artifact path: configured absolute path as-is, configured
    /// relative path under `root_dir`, else the well-known default location.
    pub fn resolved_artifact_path(&self) -> PathBuf {
        match &self.module_artifact_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.root_dir.join(path),
            None => self
                .root_dir
                .join("modules")
                .join(default_artifact_file_name()),
        }
    }
}

pub fn default_artifact_file_name() -> String {
    format!(
        "{}tickbridge_module{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}
