//! Error types for scratchpad-core.

use thiserror::Error;

/// Result type for scratchpad-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scratchpad-core.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Toolchain error.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// Execution error.
    #[error("execution error: {0}")]
    Execution(String),

    /// Workspace metadata could not be loaded.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// Operation is not supported.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    /// Render the error with a recovery hint where one is known.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Error::Toolchain(_) => Some("install Rust via https://rustup.rs and make sure rustc is on PATH"),
            Error::Workspace(_) => Some("run the command from inside a cargo workspace, or drop --module"),
            Error::Unsupported(_) => Some("use one of the targets listed by `scratchpad targets`"),
            _ => None,
        };

        match hint {
            Some(hint) => format!("{}\n  hint: {}", self, hint),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_appended_for_toolchain() {
        let err = Error::Toolchain("rustc not found".to_string());
        let rendered = err.with_hint();
        assert!(rendered.starts_with("toolchain error: rustc not found"));
        assert!(rendered.contains("hint:"));
    }

    #[test]
    fn test_hint_appended_for_workspace() {
        let err = Error::Workspace("cargo metadata failed".to_string());
        assert!(err.with_hint().ends_with("hint: run the command from inside a cargo workspace, or drop --module"));
    }

    #[test]
    fn test_no_hint_for_execution() {
        let err = Error::Execution("boom".to_string());
        assert_eq!(err.with_hint(), "execution error: boom");
    }
}
