//! Scratch sessions and the buffers they resolve to.
//!
//! A [`ScratchSession`] is one user-initiated run request. Resolving it yields
//! a [`ScratchFile`], which is what providers, executors and output handlers
//! operate on.

use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::target::RunTarget;

/// Language of a scratch buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    /// Create a language from its id. Ids are lowercased.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().to_ascii_lowercase())
    }

    /// The Rust language.
    pub fn rust() -> Self {
        Self::new("rust")
    }

    /// Detect the language from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "rs" => Some(Self::rust()),
            _ => None,
        }
    }

    /// Language id.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a scratch buffer is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Statement-at-a-time execution in an interactive evaluator.
    Repl,
    /// Whole-file compilation followed by a single run.
    #[default]
    Compile,
}

/// A workspace module that owns a scratch file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    name: String,
}

impl ModuleRef {
    /// Reference a module by package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Options chosen for a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Execution mode.
    pub mode: RunMode,
    /// Build the owning module before running.
    pub make_before_run: bool,
    /// Owning module, if known.
    pub module: Option<ModuleRef>,
    /// Compile profile.
    pub target: RunTarget,
    /// Rust edition to compile with. Falls back to the module's edition.
    pub edition: Option<String>,
}

/// One user-initiated run of a scratch buffer.
#[derive(Debug, Clone)]
pub struct ScratchSession {
    id: Uuid,
    path: PathBuf,
    options: RunOptions,
}

impl ScratchSession {
    /// Create a session for the buffer at `path`.
    pub fn new(path: impl Into<PathBuf>, options: RunOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            options,
        }
    }

    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path of the source buffer.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Resolve the source buffer.
    ///
    /// Returns `None` when the file does not exist or has no known language.
    pub fn resolve(&self) -> Option<ScratchFile> {
        if !self.path.is_file() {
            return None;
        }
        let language = Language::from_path(&self.path)?;
        let name = self.path.file_name()?.to_string_lossy().to_string();

        Some(ScratchFile {
            session_id: self.id,
            path: self.path.clone(),
            name,
            language,
            options: self.options.clone(),
        })
    }
}

/// A resolved scratch buffer.
#[derive(Debug, Clone)]
pub struct ScratchFile {
    session_id: Uuid,
    path: PathBuf,
    name: String,
    language: Language,
    options: RunOptions,
}

impl ScratchFile {
    /// Id of the session this buffer was resolved for.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Path of the buffer on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name, for messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File stem, used for build artifacts.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// Buffer language.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Options of the owning session.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Read the buffer contents.
    pub fn read_source(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path(Path::new("a/b.rs")), Some(Language::rust()));
        assert_eq!(Language::from_path(Path::new("notes.txt")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_language_lowercased() {
        assert_eq!(Language::new("Rust"), Language::rust());
        assert_eq!(Language::rust().to_string(), "rust");
    }

    #[test]
    fn test_resolve_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scratch.rs");
        fs::write(&path, "fn main() {}").unwrap();

        let session = ScratchSession::new(&path, RunOptions::default());
        let file = session.resolve().expect("should resolve");

        assert_eq!(file.name(), "scratch.rs");
        assert_eq!(file.stem(), "scratch");
        assert_eq!(file.language(), &Language::rust());
        assert_eq!(file.session_id(), session.id());
        assert_eq!(file.read_source().unwrap(), "fn main() {}");
    }

    #[test]
    fn test_resolve_missing_file() {
        let temp = TempDir::new().unwrap();
        let session = ScratchSession::new(temp.path().join("gone.rs"), RunOptions::default());
        assert!(session.resolve().is_none());
    }

    #[test]
    fn test_resolve_unknown_language() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scratch.txt");
        fs::write(&path, "hello").unwrap();

        let session = ScratchSession::new(&path, RunOptions::default());
        assert!(session.resolve().is_none());
    }

    #[test]
    fn test_default_options() {
        let options = RunOptions::default();
        assert_eq!(options.mode, RunMode::Compile);
        assert!(!options.make_before_run);
        assert!(options.module.is_none());
        assert_eq!(options.target.name, "debug");
    }
}
