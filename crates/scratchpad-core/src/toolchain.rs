//! Toolchain discovery for scratch runs.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Locates the Rust compiler and the optional REPL.
#[derive(Debug, Clone)]
pub struct ToolchainManager {
    /// Path to rustc
    rustc_path: PathBuf,

    /// Path to the evcxr REPL, if installed
    repl_path: Option<PathBuf>,

    /// Toolchain version string
    version: String,
}

impl ToolchainManager {
    /// Detect available tools.
    pub fn new() -> Result<Self> {
        let rustc_path = Self::find_rustc()?;
        let version = Self::get_rustc_version(&rustc_path)?;
        let repl_path = which::which("evcxr").ok();

        if repl_path.is_none() {
            tracing::debug!("evcxr not found on PATH, REPL mode unavailable");
        }

        Ok(Self {
            rustc_path,
            repl_path,
            version,
        })
    }

    /// Build a manager from known paths without probing.
    pub fn with_paths(rustc_path: PathBuf, repl_path: Option<PathBuf>) -> Self {
        Self {
            rustc_path,
            repl_path,
            version: String::new(),
        }
    }

    /// Get the rustc path.
    pub fn rustc_path(&self) -> &Path {
        &self.rustc_path
    }

    /// Get the REPL path, if installed.
    pub fn repl_path(&self) -> Option<&Path> {
        self.repl_path.as_deref()
    }

    /// Get the toolchain version.
    pub fn version(&self) -> &str {
        &self.version
    }

    fn find_rustc() -> Result<PathBuf> {
        which::which("rustc").map_err(|e| Error::Toolchain(format!("rustc not found: {}", e)))
    }

    fn get_rustc_version(rustc: &Path) -> Result<String> {
        let output = Command::new(rustc)
            .arg("--version")
            .output()
            .map_err(|e| Error::Toolchain(format!("Failed to run rustc: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Toolchain("rustc --version failed".to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_paths() {
        let toolchain = ToolchainManager::with_paths(PathBuf::from("/usr/bin/rustc"), None);
        assert_eq!(toolchain.rustc_path(), Path::new("/usr/bin/rustc"));
        assert!(toolchain.repl_path().is_none());
        assert!(toolchain.version().is_empty());
    }
}
