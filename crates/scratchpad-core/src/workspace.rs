//! Cargo workspace index.
//!
//! Loading the index is the host's indexing phase: the scratch run needs it
//! to link against the owning module's compiled library.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::session::ModuleRef;
use crate::target::RunTarget;

/// Find the workspace root by walking up from `path` to the nearest `Cargo.toml`.
pub fn find_workspace_root(path: &Path) -> Option<PathBuf> {
    let mut current = if path.is_dir() {
        Some(path)
    } else {
        path.parent()
    };

    while let Some(dir) = current {
        if dir.join("Cargo.toml").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }

    None
}

/// `cargo metadata --format-version 1` output (the parts we use).
#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
    target_directory: PathBuf,
    workspace_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    #[serde(default = "default_edition")]
    edition: String,
    targets: Vec<Target>,
}

fn default_edition() -> String {
    "2015".to_string()
}

#[derive(Debug, Deserialize)]
struct Target {
    name: String,
    kind: Vec<String>,
}

impl Target {
    fn is_library(&self) -> bool {
        self.kind.iter().any(|k| k == "lib" || k == "rlib")
    }
}

/// Compiled library of a module, as rustc needs it for `--extern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleArtifacts {
    /// Crate name as used in source (`my_lib`).
    pub crate_name: String,
    /// Path of the module's rlib.
    pub rlib: PathBuf,
    /// Directory holding the module's dependencies.
    pub deps_dir: PathBuf,
    /// Edition the module is written in.
    pub edition: String,
}

/// What the index knows about one package.
#[derive(Debug, Clone)]
struct PackageInfo {
    /// Library crate name (`None` for binary-only packages).
    lib: Option<String>,
    edition: String,
}

/// Index of workspace packages.
#[derive(Debug, Clone)]
pub struct WorkspaceIndex {
    root: PathBuf,
    target_dir: PathBuf,
    packages: FxHashMap<String, PackageInfo>,
}

impl WorkspaceIndex {
    /// Load the index for the workspace at `root` via `cargo metadata`.
    pub async fn load(root: &Path) -> Result<Self> {
        tracing::debug!("Loading workspace metadata for {}", root.display());

        let output = Command::new("cargo")
            .current_dir(root)
            .args(["metadata", "--format-version", "1", "--no-deps"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Workspace(format!("Failed to run cargo metadata: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Workspace(format!(
                "cargo metadata failed in {}: {}",
                root.display(),
                stderr.trim()
            )));
        }

        Self::from_metadata_json(&String::from_utf8_lossy(&output.stdout))
    }

    /// Build the index from `cargo metadata` JSON.
    pub fn from_metadata_json(json: &str) -> Result<Self> {
        let metadata: Metadata = serde_json::from_str(json)?;

        let packages = metadata
            .packages
            .into_iter()
            .map(|package| {
                let lib = package
                    .targets
                    .iter()
                    .find(|t| t.is_library())
                    .map(|t| t.name.replace('-', "_"));
                let info = PackageInfo {
                    lib,
                    edition: package.edition,
                };
                (package.name, info)
            })
            .collect();

        Ok(Self {
            root: metadata.workspace_root,
            target_dir: metadata.target_directory,
            packages,
        })
    }

    /// Workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the workspace has a package named like `module`.
    pub fn contains(&self, module: &ModuleRef) -> bool {
        self.packages.contains_key(module.name())
    }

    /// Library crate name of `module`, if it has a library target.
    pub fn lib_name(&self, module: &ModuleRef) -> Option<&str> {
        self.packages.get(module.name())?.lib.as_deref()
    }

    /// Where cargo puts the library of `module` for `target`.
    pub fn module_artifacts(&self, module: &ModuleRef, target: &RunTarget) -> Option<ModuleArtifacts> {
        let crate_name = self.lib_name(module)?.to_string();
        let edition = self.packages.get(module.name())?.edition.clone();
        let profile_dir = self.target_dir.join(&target.profile_dir);

        Some(ModuleArtifacts {
            rlib: profile_dir.join(format!("lib{}.rlib", crate_name)),
            deps_dir: profile_dir.join("deps"),
            crate_name,
            edition,
        })
    }
}
