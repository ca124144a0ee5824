//! Module builds that run before a scratch file.

use std::path::PathBuf;
use std::process::Stdio;

use futures::future::BoxFuture;
use tokio::process::Command;

use crate::diagnostics::DiagnosticSummary;
use crate::session::ModuleRef;

/// Outcome of a module build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// The build did not run to completion.
    pub aborted: bool,
    /// Error diagnostics.
    pub errors: usize,
    /// Warning diagnostics.
    pub warnings: usize,
}

impl BuildResult {
    /// Build that never ran to completion.
    pub fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }

    /// Whether the build should be reported as failed.
    pub fn is_failure(&self) -> bool {
        self.aborted || self.errors > 0
    }
}

/// Builds workspace modules.
pub trait BuildService: Send + Sync {
    /// Build `modules`, resolving once the build is over.
    fn build(&self, modules: &[ModuleRef]) -> BoxFuture<'static, BuildResult>;
}

/// Builds modules with `cargo build -p`.
#[derive(Debug, Clone)]
pub struct CargoBuildService {
    workspace_root: PathBuf,
    release: bool,
}

impl CargoBuildService {
    /// Build in the workspace at `workspace_root`.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            release: false,
        }
    }

    /// Build with `--release`.
    pub fn release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    fn command(&self, modules: &[ModuleRef]) -> Command {
        let mut cmd = Command::new("cargo");
        cmd.current_dir(&self.workspace_root)
            .arg("build")
            .arg("--message-format=json")
            .stdin(Stdio::null());

        for module in modules {
            cmd.arg("-p").arg(module.name());
        }

        if self.release {
            cmd.arg("--release");
        }

        cmd
    }
}

impl BuildService for CargoBuildService {
    fn build(&self, modules: &[ModuleRef]) -> BoxFuture<'static, BuildResult> {
        let mut cmd = self.command(modules);
        let names: Vec<String> = modules.iter().map(|m| m.name().to_string()).collect();

        Box::pin(async move {
            tracing::info!("Building {}", names.join(", "));

            let output = match cmd.output().await {
                Ok(output) => output,
                Err(e) => {
                    tracing::error!("Failed to run cargo build: {}", e);
                    return BuildResult::aborted();
                }
            };

            // Killed by a signal
            if output.status.code().is_none() {
                return BuildResult::aborted();
            }

            let summary = DiagnosticSummary::from_cargo(&String::from_utf8_lossy(&output.stdout));
            let mut result = BuildResult {
                aborted: false,
                errors: summary.errors(),
                warnings: summary.warnings(),
            };

            // Failures outside rustc (bad package name, resolver errors) produce no diagnostics.
            if !output.status.success() && result.errors == 0 {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!("cargo build failed: {}", stderr.trim());
                result.errors = 1;
            }

            tracing::debug!(
                "Build of {} finished: {} errors, {} warnings",
                names.join(", "),
                result.errors,
                result.warnings
            );
            result
        })
    }
}
