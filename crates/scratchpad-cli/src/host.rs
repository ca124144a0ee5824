//! Assembles the runner and its collaborators for one scratch file.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use scratchpad_core::workspace::find_workspace_root;
use scratchpad_core::{
    CargoBuildService, HostReadiness, Language, ProviderRegistry, ReadinessGate, RunOptions,
    RustProvider, ScratchRunner, ToolchainManager, WorkspaceIndex,
};

use crate::console::ConsoleHandler;

/// Everything a command needs to run a scratch file.
pub struct ScratchHost {
    pub runner: ScratchRunner,
    pub console: Arc<ConsoleHandler>,
    gate: ReadinessGate,
}

impl ScratchHost {
    /// Set up the host for the scratch file at `scratch_path` (absolute).
    ///
    /// Starts indexing the enclosing cargo workspace in the background.
    pub fn new(scratch_path: &Path, release: bool) -> anyhow::Result<Self> {
        let toolchain = ToolchainManager::new()?;
        tracing::debug!("Using {}", toolchain.version());

        let console = Arc::new(ConsoleHandler::new());
        let gate = ReadinessGate::new();
        let index = Arc::new(OnceLock::new());

        let workspace_root = find_workspace_root(scratch_path);
        match &workspace_root {
            Some(root) => spawn_indexing(root, &gate, index.clone()),
            None => tracing::debug!("{} is not inside a cargo workspace", scratch_path.display()),
        }

        let build_root = workspace_root
            .or_else(|| scratch_path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| ".".into());
        let build = CargoBuildService::new(build_root).release(release);

        let mut providers = ProviderRegistry::new();
        providers.register(
            Language::rust(),
            Arc::new(RustProvider::new(toolchain, console.clone()).with_index(index)),
        );

        Ok(Self {
            runner: ScratchRunner::new(providers, Arc::new(build), Arc::new(gate.clone())),
            console,
            gate,
        })
    }

    /// Wait for workspace indexing when the run links a module.
    ///
    /// Runs that build first are deferred by the runner itself; the rest
    /// would otherwise compile before the module's library is known.
    pub async fn prepare(&self, options: &RunOptions) {
        let Some(module) = &options.module else {
            return;
        };
        if options.make_before_run || !self.gate.is_indexing() {
            return;
        }

        tracing::debug!("Waiting for workspace indexing before linking {}", module);
        self.gate.when_ready().await;
    }
}

/// Load the workspace index while holding the gate closed.
fn spawn_indexing(root: &Path, gate: &ReadinessGate, slot: Arc<OnceLock<WorkspaceIndex>>) {
    let guard = gate.begin_indexing();
    let root = root.to_path_buf();

    tokio::spawn(async move {
        let _guard = guard;
        match WorkspaceIndex::load(&root).await {
            Ok(index) => {
                tracing::debug!("Indexed workspace {}", index.root().display());
                let _ = slot.set(index);
            }
            Err(e) => tracing::warn!("Workspace indexing failed: {}", e.with_hint()),
        }
    });
}
