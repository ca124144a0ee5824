//! Run command implementation for Scratchpad CLI.
//!
//! Runs a scratch file once and waits for it to finish.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use scratchpad_core::{
    ControlFlag, Language, ModuleRef, RunMode, RunOptions, RunTarget, ScratchSession,
    TargetPresets,
};

use crate::host::ScratchHost;

/// Options shared by `run` and `watch`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the scratch file (.rs)
    pub file: String,

    /// Run in the evcxr REPL instead of compiling
    #[arg(long)]
    pub repl: bool,

    /// Build the owning module before running
    #[arg(long)]
    pub make: bool,

    /// Workspace package the scratch file belongs to
    #[arg(long)]
    pub module: Option<String>,

    /// Run target (see `scratchpad targets`)
    #[arg(long, default_value = "debug")]
    pub target: String,

    /// Rust edition (defaults to the module's edition, else 2021)
    #[arg(long)]
    pub edition: Option<String>,
}

impl RunArgs {
    /// Validate the scratch path, returning it canonicalized.
    pub fn scratch_path(&self) -> anyhow::Result<PathBuf> {
        let path = Path::new(&self.file);
        if !path.exists() {
            anyhow::bail!("Scratch file not found: {}", self.file);
        }
        let abs_path = path.canonicalize()?;
        if Language::from_path(&abs_path).is_none() {
            anyhow::bail!("Unsupported scratch file type: {}", self.file);
        }
        Ok(abs_path)
    }

    /// Resolve the selected run target.
    pub fn run_target(&self) -> anyhow::Result<RunTarget> {
        let targets = TargetPresets::standard();
        targets.get(&self.target).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown target '{}' (available: {})",
                self.target,
                targets.names().join(", ")
            )
        })
    }

    /// Run options for a session.
    pub fn options(&self, target: RunTarget) -> RunOptions {
        if self.make && self.module.is_none() {
            tracing::warn!("--make has no effect without --module");
        }

        RunOptions {
            mode: if self.repl { RunMode::Repl } else { RunMode::Compile },
            make_before_run: self.make,
            module: self.module.as_deref().map(ModuleRef::new),
            target,
            edition: self.edition.clone(),
        }
    }
}

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> anyhow::Result<()> {
    let path = args.scratch_path()?;
    let target = args.run_target()?;
    let host = ScratchHost::new(&path, target.is_release())?;

    let options = args.options(target);
    host.prepare(&options).await;

    let session = ScratchSession::new(&path, options);
    let control = ControlFlag::new();

    host.runner.run(&session, Arc::new(control.clone())).await;
    // Disabled while executing; re-enabled right after the final `on_finish`.
    control.enabled().await;

    let errors = host.console.error_count();
    if errors > 0 {
        anyhow::bail!("Scratch run reported {} error(s)", errors);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(file: &str) -> RunArgs {
        RunArgs {
            file: file.to_string(),
            repl: false,
            make: false,
            module: None,
            target: "debug".to_string(),
            edition: None,
        }
    }

    #[test]
    fn test_options_mapping() {
        let mut run_args = args("scratch.rs");
        run_args.repl = true;
        run_args.make = true;
        run_args.module = Some("geometry".to_string());
        run_args.edition = Some("2024".to_string());

        let options = run_args.options(RunTarget::default());
        assert_eq!(options.mode, RunMode::Repl);
        assert!(options.make_before_run);
        assert_eq!(options.module, Some(ModuleRef::new("geometry")));
        assert_eq!(options.edition.as_deref(), Some("2024"));
    }

    #[test]
    fn test_unknown_target() {
        let mut run_args = args("scratch.rs");
        run_args.target = "wasm".to_string();

        let err = run_args.run_target().unwrap_err().to_string();
        assert!(err.contains("debug, release"));
    }

    #[test]
    fn test_missing_scratch_file() {
        assert!(args("/definitely/not/here.rs").scratch_path().is_err());
    }
}
