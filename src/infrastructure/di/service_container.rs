//! Service container for dependency injection
//!
//! Wires settings and I/O boundaries for the commands.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::{Replay, Script};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding settings and I/O abstractions.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
        }
    }

    /// Read and parse a session script.
    pub fn load_script(&self, path: &Path) -> InfraResult<Script> {
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read script {}", path.display()), e))?;
        debug!("loaded script {} ({} bytes)", path.display(), content.len());
        Ok(Script::parse(&content)?)
    }

    /// Load a script and replay it.
    pub fn replay(&self, path: &Path) -> InfraResult<Replay> {
        Ok(self.load_script(path)?.run()?)
    }
}
