//! Core engine for Scratchpad scratch files.
//!
//! This crate provides:
//! - The run orchestrator that drives a scratch run from request to finish
//! - Capability traits for providers, executors, output handlers, builds and host readiness
//! - A Rust host: rustc and evcxr executors, cargo module builds, workspace indexing
//! - The run target registry

pub mod build;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod host;
pub mod output;
pub mod paths;
pub mod provider;
pub mod runner;
pub mod session;
pub mod target;
pub mod toolchain;
pub mod workspace;

pub use build::{BuildResult, BuildService, CargoBuildService};
pub use control::{ControlFlag, RunControl};
pub use error::{Error, Result};
pub use executor::{CompilingExecutor, ReplExecutor, ScratchExecutor};
pub use host::{HostReadiness, IndexingGuard, ReadinessGate};
pub use output::{CompletionObserver, HandlerSet, OutputHandler, OutputKind, ScratchOutput};
pub use paths::ScratchDirs;
pub use provider::{ProviderRegistry, RustProvider, ScratchProvider};
pub use runner::{RunPhase, ScratchRunner};
pub use session::{Language, ModuleRef, RunMode, RunOptions, ScratchFile, ScratchSession};
pub use target::{NamedTarget, RunTarget, TargetKind, TargetPresets, TargetRegistry};
pub use toolchain::ToolchainManager;
pub use workspace::{ModuleArtifacts, WorkspaceIndex};
