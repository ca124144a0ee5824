//! Executors for scratch files.
//!
//! # Executors
//!
//! - **`CompilingExecutor`** - Compiles the whole file with rustc, then runs the binary once.
//! - **`ReplExecutor`** - Feeds the file to the evcxr REPL and streams what it prints.
//!
//! Both return from [`ScratchExecutor::execute`] as soon as their work is
//! spawned on the tokio runtime, and report `on_finish` to every attached
//! handler when the work is over.
//!
//! # Module Structure
//!
//! - `compiling` - CompilingExecutor
//! - `repl` - ReplExecutor

mod compiling;
mod repl;

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;

use crate::error::{Error, Result};
use crate::output::{HandlerSet, OutputHandler, OutputKind, ScratchOutput};
use crate::session::ScratchFile;

pub use compiling::CompilingExecutor;
pub use repl::ReplExecutor;

/// Runs a scratch file and reports to its output handlers.
pub trait ScratchExecutor: Send {
    /// Attach a handler. Every handler receives every event.
    fn add_output_handler(&mut self, handler: Arc<dyn OutputHandler>);

    /// Start executing.
    ///
    /// An `Ok` return means the run was started; its end is signalled through
    /// `on_finish`. An `Err` means nothing was started.
    fn execute(&mut self) -> Result<()>;
}

/// Handle of the ambient tokio runtime.
pub(crate) fn runtime() -> Result<tokio::runtime::Handle> {
    tokio::runtime::Handle::try_current()
        .map_err(|e| Error::Execution(format!("no async runtime available: {}", e)))
}

async fn stream_lines<R: AsyncRead + Unpin>(
    reader: R,
    file: &ScratchFile,
    handlers: &HandlerSet,
    kind: OutputKind,
) -> io::Result<()> {
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        handlers.handle(file, &ScratchOutput::new(line, kind));
    }
    Ok(())
}

/// Forward a child's stdout and stderr to `handlers` line by line, then wait for it.
pub(crate) async fn pump_output(
    mut child: Child,
    file: &ScratchFile,
    handlers: &HandlerSet,
    stdout_kind: OutputKind,
) -> io::Result<ExitStatus> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let out = async {
        match stdout {
            Some(stdout) => stream_lines(stdout, file, handlers, stdout_kind).await,
            None => Ok(()),
        }
    };
    let err = async {
        match stderr {
            Some(stderr) => stream_lines(stderr, file, handlers, OutputKind::Stderr).await,
            None => Ok(()),
        }
    };

    let (out, err) = tokio::join!(out, err);
    out?;
    err?;

    child.wait().await
}

#[cfg(test)]
pub(crate) mod testing {
    //! Handler that records executor events for assertions.

    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::sync::Notify;

    use crate::output::{OutputHandler, OutputKind, ScratchOutput};
    use crate::session::ScratchFile;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Output(OutputKind, String),
        Error(String),
        Finish,
    }

    #[derive(Default)]
    pub struct EventLog {
        events: Mutex<Vec<Event>>,
        finished: Notify,
    }

    impl EventLog {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub fn errors(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Error(message) => Some(message),
                    _ => None,
                })
                .collect()
        }

        pub fn finishes(&self) -> usize {
            self.events().iter().filter(|e| **e == Event::Finish).count()
        }

        /// Wait for the first `on_finish`, then give stray events a moment to arrive.
        pub async fn wait_finished(&self) {
            tokio::time::timeout(Duration::from_secs(30), self.finished.notified())
                .await
                .expect("executor never finished");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl OutputHandler for EventLog {
        fn handle(&self, _file: &ScratchFile, output: &ScratchOutput) {
            self.push(Event::Output(output.kind, output.text.clone()));
        }

        fn error(&self, _file: &ScratchFile, message: &str) {
            self.push(Event::Error(message.to_string()));
        }

        fn on_finish(&self, _file: &ScratchFile) {
            self.push(Event::Finish);
            self.finished.notify_one();
        }
    }
}
