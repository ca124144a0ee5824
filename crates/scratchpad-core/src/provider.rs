//! Language providers.
//!
//! A provider knows how to execute scratch files of one language and which
//! output handler reports their runs.

use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;

use crate::executor::{CompilingExecutor, ReplExecutor, ScratchExecutor};
use crate::output::OutputHandler;
use crate::paths::ScratchDirs;
use crate::session::{Language, ScratchFile};
use crate::toolchain::ToolchainManager;
use crate::workspace::WorkspaceIndex;

/// Execution provider for one language.
pub trait ScratchProvider: Send + Sync {
    /// Handler that reports runs of this language.
    fn output_handler(&self) -> Arc<dyn OutputHandler>;

    /// Executor for REPL mode, if one can be built.
    fn create_repl_executor(&self, file: &ScratchFile) -> Option<Box<dyn ScratchExecutor>>;

    /// Executor for compile mode, if one can be built.
    fn create_compiling_executor(&self, file: &ScratchFile) -> Option<Box<dyn ScratchExecutor>>;
}

/// Providers keyed by language.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: FxHashMap<Language, Arc<dyn ScratchProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for `language`, replacing any previous one.
    pub fn register(&mut self, language: Language, provider: Arc<dyn ScratchProvider>) {
        self.providers.insert(language, provider);
    }

    /// Provider for `language`.
    pub fn get(&self, language: &Language) -> Option<Arc<dyn ScratchProvider>> {
        self.providers.get(language).cloned()
    }
}

/// Provider for Rust scratch files.
pub struct RustProvider {
    toolchain: ToolchainManager,
    handler: Arc<dyn OutputHandler>,
    /// Filled in once workspace indexing completes.
    index: Arc<OnceLock<WorkspaceIndex>>,
}

impl RustProvider {
    pub fn new(toolchain: ToolchainManager, handler: Arc<dyn OutputHandler>) -> Self {
        Self {
            toolchain,
            handler,
            index: Arc::new(OnceLock::new()),
        }
    }

    /// Share a workspace index slot with the host's indexing job.
    pub fn with_index(mut self, index: Arc<OnceLock<WorkspaceIndex>>) -> Self {
        self.index = index;
        self
    }
}

impl ScratchProvider for RustProvider {
    fn output_handler(&self) -> Arc<dyn OutputHandler> {
        self.handler.clone()
    }

    fn create_repl_executor(&self, file: &ScratchFile) -> Option<Box<dyn ScratchExecutor>> {
        let repl_path = self.toolchain.repl_path()?;
        Some(Box::new(ReplExecutor::new(file.clone(), repl_path.to_path_buf())))
    }

    fn create_compiling_executor(&self, file: &ScratchFile) -> Option<Box<dyn ScratchExecutor>> {
        let dirs = match ScratchDirs::from_scratch_path(file.path()) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!("Cannot prepare build directory for {}: {}", file.name(), e);
                return None;
            }
        };

        let mut executor = CompilingExecutor::new(file.clone(), self.toolchain.clone(), dirs);

        if let Some(module) = &file.options().module {
            match self.index.get() {
                Some(index) if !index.contains(module) => {
                    tracing::warn!("{} is not a package of workspace {}", module, index.root().display())
                }
                Some(index) => match index.module_artifacts(module, &file.options().target) {
                    Some(artifacts) => executor = executor.with_module(artifacts),
                    None => tracing::warn!("Module {} has no library target", module),
                },
                None => tracing::warn!("Workspace not indexed yet, running without module {}", module),
            }
        }

        Some(Box::new(executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::session::{RunOptions, ScratchSession};

    struct Silent;
    impl OutputHandler for Silent {}

    fn rust_file(temp: &TempDir) -> ScratchFile {
        let path = temp.path().join("scratch.rs");
        fs::write(&path, "fn main() {}").unwrap();
        ScratchSession::new(path, RunOptions::default())
            .resolve()
            .unwrap()
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ProviderRegistry::new();
        let toolchain = ToolchainManager::with_paths(PathBuf::from("rustc"), None);
        registry.register(Language::rust(), Arc::new(RustProvider::new(toolchain, Arc::new(Silent))));

        assert!(registry.get(&Language::rust()).is_some());
        assert!(registry.get(&Language::new("kotlin")).is_none());
    }

    #[test]
    fn test_no_repl_without_evcxr() {
        let temp = TempDir::new().unwrap();
        let toolchain = ToolchainManager::with_paths(PathBuf::from("rustc"), None);
        let provider = RustProvider::new(toolchain, Arc::new(Silent));

        assert!(provider.create_repl_executor(&rust_file(&temp)).is_none());
    }

    #[test]
    fn test_repl_with_evcxr() {
        let temp = TempDir::new().unwrap();
        let toolchain =
            ToolchainManager::with_paths(PathBuf::from("rustc"), Some(PathBuf::from("evcxr")));
        let provider = RustProvider::new(toolchain, Arc::new(Silent));

        assert!(provider.create_repl_executor(&rust_file(&temp)).is_some());
    }

    #[test]
    fn test_compiling_executor_prepares_build_dir() {
        let temp = TempDir::new().unwrap();
        let toolchain = ToolchainManager::with_paths(PathBuf::from("rustc"), None);
        let provider = RustProvider::new(toolchain, Arc::new(Silent));

        assert!(provider.create_compiling_executor(&rust_file(&temp)).is_some());
        assert!(temp.path().join(".scratch/build").is_dir());
    }
}
