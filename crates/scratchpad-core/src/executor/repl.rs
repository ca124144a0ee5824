//! REPL executor backed by evcxr.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};

use crate::error::Result;
use crate::output::{HandlerSet, OutputHandler, OutputKind};
use crate::session::ScratchFile;

use super::{ScratchExecutor, pump_output, runtime};

/// Feeds a scratch file to the evcxr REPL.
///
/// Each run starts a fresh REPL process.
pub struct ReplExecutor {
    file: ScratchFile,
    repl_path: PathBuf,
    handlers: HandlerSet,
}

impl ReplExecutor {
    pub fn new(file: ScratchFile, repl_path: PathBuf) -> Self {
        Self {
            file,
            repl_path,
            handlers: HandlerSet::new(),
        }
    }
}

impl ScratchExecutor for ReplExecutor {
    fn add_output_handler(&mut self, handler: Arc<dyn OutputHandler>) {
        self.handlers.add(handler);
    }

    fn execute(&mut self) -> Result<()> {
        let handle = runtime()?;
        let source = self.file.read_source()?;

        let child = Command::new(&self.repl_path)
            .current_dir(self.file.path().parent().unwrap_or(std::path::Path::new(".")))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let file = self.file.clone();
        let handlers = self.handlers.clone();

        handle.spawn(async move {
            let mut child = child;
            let stdin = child.stdin.take();

            let feed = async {
                if let Some(stdin) = stdin {
                    if let Err(e) = feed_source(stdin, &source).await {
                        tracing::debug!("REPL closed its input early: {}", e);
                    }
                }
            };
            let (_, status) = tokio::join!(feed, pump_output(child, &file, &handlers, OutputKind::Result));

            match status {
                Ok(status) if status.success() => {}
                Ok(status) => handlers.error(&file, &format!("REPL finished with {}", status)),
                Err(e) => handlers.error(&file, &format!("Lost REPL output: {}", e)),
            }
            handlers.on_finish(&file);
        });

        Ok(())
    }
}

/// Write the buffer, then close stdin so the REPL exits.
async fn feed_source(mut stdin: ChildStdin, source: &str) -> std::io::Result<()> {
    stdin.write_all(repl_input(source).as_bytes()).await?;
    stdin.flush().await?;
    drop(stdin);
    Ok(())
}

/// The buffer as fed to the REPL: leading and trailing blank lines dropped,
/// everything in between passed through untouched.
fn repl_input(source: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .unwrap_or(first);

    let mut input = lines[first..=last].join("\n");
    input.push('\n');
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::executor::testing::{Event, EventLog};
    use crate::session::{RunMode, RunOptions, ScratchSession};

    fn repl_file(temp: &TempDir, source: &str) -> ScratchFile {
        let path = temp.path().join("scratch.rs");
        fs::write(&path, source).unwrap();
        let options = RunOptions {
            mode: RunMode::Repl,
            ..RunOptions::default()
        };
        ScratchSession::new(path, options).resolve().unwrap()
    }

    #[test]
    fn test_repl_input_keeps_inner_blank_lines() {
        let source = "\n\nlet s = \"a\n\nb\";\n\nfn double(n: i32) -> i32 {\n    n * 2\n}\n\n\n";
        assert_eq!(
            repl_input(source),
            "let s = \"a\n\nb\";\n\nfn double(n: i32) -> i32 {\n    n * 2\n}\n"
        );
    }

    #[test]
    fn test_repl_input_empty_source() {
        assert_eq!(repl_input(""), "");
        assert_eq!(repl_input("\n   \n\t\n"), "");
    }

    #[tokio::test]
    async fn test_repl_output_reported_as_results() {
        let temp = TempDir::new().unwrap();
        let file = repl_file(&temp, "let x = 1;\n\nx + 1\n");
        let log = Arc::new(EventLog::default());

        // `cat` echoes its input like a REPL that prints every line.
        let mut executor = ReplExecutor::new(file, PathBuf::from("cat"));
        executor.add_output_handler(log.clone());
        executor.execute().unwrap();
        log.wait_finished().await;

        assert_eq!(
            log.events(),
            vec![
                Event::Output(OutputKind::Result, "let x = 1;".to_string()),
                Event::Output(OutputKind::Result, String::new()),
                Event::Output(OutputKind::Result, "x + 1".to_string()),
                Event::Finish,
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_repl_reports_then_finishes_once() {
        let temp = TempDir::new().unwrap();
        let file = repl_file(&temp, "1 + 1\n");
        let log = Arc::new(EventLog::default());

        let mut executor = ReplExecutor::new(file, PathBuf::from("false"));
        executor.add_output_handler(log.clone());
        executor.execute().unwrap();
        log.wait_finished().await;

        let errors = log.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("REPL finished with"));
        assert_eq!(log.finishes(), 1);
        assert_eq!(log.events().last(), Some(&Event::Finish));
    }

    #[tokio::test]
    async fn test_missing_repl_binary_starts_nothing() {
        let temp = TempDir::new().unwrap();
        let file = repl_file(&temp, "1 + 1\n");
        let log = Arc::new(EventLog::default());

        let mut executor = ReplExecutor::new(file, PathBuf::from("/nonexistent/evcxr"));
        executor.add_output_handler(log.clone());

        assert!(executor.execute().is_err());
        assert!(log.events().is_empty());
    }
}
