//! Parsing of rustc and cargo JSON diagnostics.

use serde::Deserialize;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
    Help,
}

impl Level {
    fn parse(level: &str) -> Option<Self> {
        match level {
            // rustc reports ICEs as "error: internal compiler error"
            "error" | "error: internal compiler error" => Some(Level::Error),
            "warning" => Some(Level::Warning),
            "note" => Some(Level::Note),
            "help" => Some(Level::Help),
            _ => None,
        }
    }
}

/// Rustc JSON diagnostic format.
#[derive(Debug, Deserialize)]
pub struct RustcDiagnostic {
    pub message: String,
    pub level: String,
    pub rendered: Option<String>,
}

/// Cargo `--message-format=json` line. Only compiler messages are of interest.
#[derive(Debug, Deserialize)]
#[serde(tag = "reason")]
enum CargoMessage {
    #[serde(rename = "compiler-message")]
    CompilerMessage { message: RustcDiagnostic },
    #[serde(other)]
    Other,
}

/// A diagnostic reduced to what the output handlers need.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub rendered: Option<String>,
}

impl Diagnostic {
    /// Text to show the user.
    pub fn display(&self) -> &str {
        self.rendered.as_deref().unwrap_or(&self.message)
    }
}

/// Diagnostics collected from one compiler invocation.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSummary {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSummary {
    /// Parse rustc `--error-format=json` output (one diagnostic per line).
    pub fn from_rustc(output: &str) -> Self {
        Self::collect(output, |line| serde_json::from_str::<RustcDiagnostic>(line).map(Some))
    }

    /// Parse cargo `--message-format=json` output.
    pub fn from_cargo(output: &str) -> Self {
        Self::collect(output, |line| {
            serde_json::from_str::<CargoMessage>(line).map(|message| match message {
                CargoMessage::CompilerMessage { message } => Some(message),
                CargoMessage::Other => None,
            })
        })
    }

    fn collect(
        output: &str,
        parse: impl Fn(&str) -> serde_json::Result<Option<RustcDiagnostic>>,
    ) -> Self {
        let mut diagnostics = Vec::new();

        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse(line) {
                Ok(Some(raw)) => {
                    if let Some(level) = Level::parse(&raw.level) {
                        diagnostics.push(Diagnostic {
                            level,
                            message: raw.message,
                            rendered: raw.rendered,
                        });
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    let preview: String = line.chars().take(100).collect();
                    tracing::debug!("Skipping non-diagnostic line: {} (line: {})", e, preview);
                }
            }
        }

        Self { diagnostics }
    }

    /// Number of diagnostics at `level`.
    pub fn count(&self, level: Level) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn errors(&self) -> usize {
        self.count(Level::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Level::Warning)
    }

    /// Error diagnostics, in emission order.
    pub fn error_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.level == Level::Error)
    }
}
