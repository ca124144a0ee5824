//! Scratch directory management.
//!
//! Build artifacts for a scratch file live in a `.scratch` directory next to
//! the file, so CLI runs and watch runs share them.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory structure for scratch files in one directory.
///
/// ```text
/// scratch.rs
/// .scratch/
/// └── build/      # Compiled scratch binaries
/// ```
#[derive(Debug, Clone)]
pub struct ScratchDirs {
    /// The `.scratch` directory itself.
    pub scratch_dir: PathBuf,

    /// Build directory for compiled binaries.
    pub build_dir: PathBuf,
}

impl ScratchDirs {
    /// Create the directory structure for a scratch file.
    ///
    /// Creates all necessary directories if they don't exist.
    pub fn from_scratch_path(scratch_path: &Path) -> Result<Self> {
        let parent = scratch_path.parent().unwrap_or(Path::new("."));
        let scratch_dir = parent.join(".scratch");
        let build_dir = scratch_dir.join("build");

        fs::create_dir_all(&build_dir)?;

        Ok(Self {
            scratch_dir,
            build_dir,
        })
    }

    /// Path of the compiled binary for a scratch file stem and target.
    pub fn binary_path(&self, stem: &str, target: &str) -> PathBuf {
        let name = format!("{}-{}{}", stem, target, std::env::consts::EXE_SUFFIX);
        self.build_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_scratch_path() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let dirs = ScratchDirs::from_scratch_path(&temp.path().join("scratch.rs"))
            .expect("Failed to create dirs");

        assert!(dirs.scratch_dir.ends_with(".scratch"));
        assert!(dirs.build_dir.exists());
    }

    #[test]
    fn test_binary_path_includes_target() {
        let temp = TempDir::new().unwrap();
        let dirs = ScratchDirs::from_scratch_path(&temp.path().join("scratch.rs")).unwrap();

        let path = dirs.binary_path("scratch", "release");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("scratch-release"));
        assert_eq!(path.parent().unwrap(), dirs.build_dir);
    }
}
