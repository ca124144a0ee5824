//! Compile-and-run executor.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

use crate::diagnostics::DiagnosticSummary;
use crate::error::Result;
use crate::output::{HandlerSet, OutputHandler, OutputKind};
use crate::paths::ScratchDirs;
use crate::session::ScratchFile;
use crate::toolchain::ToolchainManager;
use crate::workspace::ModuleArtifacts;

use super::{ScratchExecutor, pump_output, runtime};

/// Edition used when neither the run options nor the module name one.
const DEFAULT_EDITION: &str = "2021";

/// Compiles a scratch file with rustc and runs the resulting binary.
pub struct CompilingExecutor {
    file: ScratchFile,
    toolchain: ToolchainManager,
    dirs: ScratchDirs,
    /// Library of the owning module, linked with `--extern`
    module: Option<ModuleArtifacts>,
    handlers: HandlerSet,
}

impl CompilingExecutor {
    pub fn new(file: ScratchFile, toolchain: ToolchainManager, dirs: ScratchDirs) -> Self {
        Self {
            file,
            toolchain,
            dirs,
            module: None,
            handlers: HandlerSet::new(),
        }
    }

    /// Link the scratch file against a module library.
    pub fn with_module(mut self, artifacts: ModuleArtifacts) -> Self {
        self.module = Some(artifacts);
        self
    }

    /// Path the compiled binary is written to.
    pub fn binary_path(&self) -> PathBuf {
        let target = &self.file.options().target;
        self.dirs.binary_path(&self.file.stem(), &target.name)
    }

    /// Edition the scratch file is compiled with.
    pub fn edition(&self) -> &str {
        self.file
            .options()
            .edition
            .as_deref()
            .or(self.module.as_ref().map(|m| m.edition.as_str()))
            .unwrap_or(DEFAULT_EDITION)
    }

    fn compile_command(&self, binary: &Path) -> Command {
        let target = &self.file.options().target;
        let mut cmd = Command::new(self.toolchain.rustc_path());

        cmd.arg(self.file.path())
            .arg(format!("--edition={}", self.edition()))
            .arg("--crate-name")
            .arg(crate_name(&self.file.stem()))
            .arg("-o")
            .arg(binary)
            .arg("--error-format=json")
            .arg(format!("-Copt-level={}", target.opt_level))
            .stdin(Stdio::null());

        if target.debug_info {
            cmd.arg("-g");
        }

        if let Some(module) = &self.module {
            if module.rlib.exists() {
                cmd.arg("-L")
                    .arg(format!("dependency={}", module.deps_dir.display()));
                cmd.arg("--extern")
                    .arg(format!("{}={}", module.crate_name, module.rlib.display()));
            } else {
                tracing::warn!(
                    "Module library {} not built yet, running without it",
                    module.rlib.display()
                );
            }
        }

        cmd
    }
}

impl ScratchExecutor for CompilingExecutor {
    fn add_output_handler(&mut self, handler: Arc<dyn OutputHandler>) {
        self.handlers.add(handler);
    }

    fn execute(&mut self) -> Result<()> {
        let handle = runtime()?;
        let binary = self.binary_path();
        let job = CompileJob {
            compile: self.compile_command(&binary),
            binary,
            file: self.file.clone(),
            handlers: self.handlers.clone(),
        };

        handle.spawn(job.run());
        Ok(())
    }
}

/// Work spawned by one `execute` call.
struct CompileJob {
    compile: Command,
    binary: PathBuf,
    file: ScratchFile,
    handlers: HandlerSet,
}

impl CompileJob {
    async fn run(mut self) {
        match self.compile().await {
            Ok(()) => self.run_binary().await,
            Err(messages) => {
                for message in messages {
                    self.handlers.error(&self.file, &message);
                }
            }
        }

        self.handlers.on_finish(&self.file);
    }

    async fn compile(&mut self) -> std::result::Result<(), Vec<String>> {
        tracing::debug!("Compiling {}", self.file.path().display());

        let output = self
            .compile
            .output()
            .await
            .map_err(|e| vec![format!("Failed to run rustc: {}", e)])?;

        let summary = DiagnosticSummary::from_rustc(&String::from_utf8_lossy(&output.stderr));
        if output.status.success() {
            if summary.warnings() > 0 {
                tracing::debug!("{} compiled with {} warnings", self.file.name(), summary.warnings());
            }
            return Ok(());
        }

        let mut messages: Vec<String> = summary
            .error_diagnostics()
            .map(|d| d.display().trim_end().to_string())
            .collect();
        if messages.is_empty() {
            messages.push(format!("rustc exited with {}", output.status));
        }
        Err(messages)
    }

    async fn run_binary(&self) {
        let workdir = self.file.path().parent().unwrap_or(Path::new("."));

        let child = Command::new(&self.binary)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                self.handlers
                    .error(&self.file, &format!("Failed to start {}: {}", self.binary.display(), e));
                return;
            }
        };

        match pump_output(child, &self.file, &self.handlers, OutputKind::Stdout).await {
            Ok(status) if status.success() => {}
            Ok(status) => self
                .handlers
                .error(&self.file, &format!("Process finished with {}", status)),
            Err(e) => self
                .handlers
                .error(&self.file, &format!("Lost output of {}: {}", self.file.name(), e)),
        }
    }
}

/// Turn a file stem into a valid crate name.
fn crate_name(stem: &str) -> String {
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "scratch_");
    }
    name
}
