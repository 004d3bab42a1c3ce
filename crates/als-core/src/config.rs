use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AlsError;

/// Server tunables, loadable from a JSON file passed via `--config`.
///
/// Every field has a default so a partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub max_cached_documents: usize,
    pub completion_timeout_ms: u64,
    pub diagnostics_delay_ms: u64,
    pub max_worker_threads: usize,
    pub log_level: String,
    pub enable_snippets: bool,
    pub max_suggestions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            max_cached_documents: 100,
            completion_timeout_ms: 200,
            diagnostics_delay_ms: 250,
            max_worker_threads: 4,
            log_level: "info".to_string(),
            enable_snippets: true,
            max_suggestions: 50,
        }
    }
}

impl ServerConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, AlsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AlsError::config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| AlsError::config(format!("cannot parse {}: {e}", path.display())))
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), AlsError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AlsError::config(e.to_string()))?;
        std::fs::write(path, contents)
            .map_err(|e| AlsError::config(format!("cannot write {}: {e}", path.display())))
    }
}
