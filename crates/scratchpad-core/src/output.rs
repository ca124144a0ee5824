//! Output handlers for scratch runs.
//!
//! Executors report lifecycle events, program output and errors to every
//! attached [`OutputHandler`].

use std::sync::{Arc, Mutex};

use crate::session::ScratchFile;

/// Where a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Program standard output.
    Stdout,
    /// Program standard error.
    Stderr,
    /// Value echoed by a REPL.
    Result,
}

/// One chunk of program output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchOutput {
    pub text: String,
    pub kind: OutputKind,
}

impl ScratchOutput {
    pub fn new(text: impl Into<String>, kind: OutputKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn stdout(text: impl Into<String>) -> Self {
        Self::new(text, OutputKind::Stdout)
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self::new(text, OutputKind::Stderr)
    }
}

/// Receiver of run events.
///
/// Every method defaults to a no-op, so implementors only override what
/// they care about.
pub trait OutputHandler: Send + Sync {
    /// A run of `file` has started.
    fn on_start(&self, _file: &ScratchFile) {}

    /// The program produced output.
    fn handle(&self, _file: &ScratchFile, _output: &ScratchOutput) {}

    /// Something went wrong.
    fn error(&self, _file: &ScratchFile, _message: &str) {}

    /// The run of `file` is over.
    fn on_finish(&self, _file: &ScratchFile) {}
}

/// Fan-out over several handlers.
///
/// Events are delivered to each handler in attachment order.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: Vec<Arc<dyn OutputHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler.
    pub fn add(&mut self, handler: Arc<dyn OutputHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl OutputHandler for HandlerSet {
    fn on_start(&self, file: &ScratchFile) {
        for handler in &self.handlers {
            handler.on_start(file);
        }
    }

    fn handle(&self, file: &ScratchFile, output: &ScratchOutput) {
        for handler in &self.handlers {
            handler.handle(file, output);
        }
    }

    fn error(&self, file: &ScratchFile, message: &str) {
        for handler in &self.handlers {
            handler.error(file, message);
        }
    }

    fn on_finish(&self, file: &ScratchFile) {
        for handler in &self.handlers {
            handler.on_finish(file);
        }
    }
}

/// Handler that runs a callback the first time a run finishes.
///
/// Later `on_finish` events are ignored.
pub struct CompletionObserver {
    callback: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl CompletionObserver {
    pub fn new(callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            callback: Mutex::new(Some(Box::new(callback))),
        }
    }
}

impl OutputHandler for CompletionObserver {
    fn on_finish(&self, _file: &ScratchFile) {
        let callback = match self.callback.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::TempDir;

    use crate::session::{RunOptions, ScratchSession};

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl OutputHandler for Recorder {
        fn on_start(&self, _file: &ScratchFile) {
            self.log.lock().unwrap().push(format!("{}:start", self.tag));
        }

        fn handle(&self, _file: &ScratchFile, output: &ScratchOutput) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:out:{}", self.tag, output.text));
        }

        fn error(&self, _file: &ScratchFile, message: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:error:{}", self.tag, message));
        }

        fn on_finish(&self, _file: &ScratchFile) {
            self.log.lock().unwrap().push(format!("{}:finish", self.tag));
        }
    }

    fn scratch_file(temp: &TempDir) -> ScratchFile {
        let path = temp.path().join("scratch.rs");
        fs::write(&path, "fn main() {}").unwrap();
        ScratchSession::new(path, RunOptions::default())
            .resolve()
            .unwrap()
    }

    #[test]
    fn test_handler_set_fans_out_in_order() {
        let temp = TempDir::new().unwrap();
        let file = scratch_file(&temp);
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut set = HandlerSet::new();
        set.add(Arc::new(Recorder { tag: "a", log: log.clone() }));
        set.add(Arc::new(Recorder { tag: "b", log: log.clone() }));
        assert_eq!(set.len(), 2);

        set.on_start(&file);
        set.handle(&file, &ScratchOutput::stdout("42"));
        set.error(&file, "bad");
        set.on_finish(&file);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "a:start", "b:start", "a:out:42", "b:out:42", "a:error:bad", "b:error:bad",
                "a:finish", "b:finish",
            ]
        );
    }

    #[test]
    fn test_completion_observer_fires_once() {
        let temp = TempDir::new().unwrap();
        let file = scratch_file(&temp);
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let observer = CompletionObserver::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        observer.on_start(&file);
        observer.error(&file, "ignored");
        assert_eq!(count.load(Ordering::SeqCst), 0);

        observer.on_finish(&file);
        observer.on_finish(&file);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_output_constructors() {
        assert_eq!(ScratchOutput::stdout("x").kind, OutputKind::Stdout);
        assert_eq!(ScratchOutput::stderr("x").kind, OutputKind::Stderr);
        assert_eq!(ScratchOutput::new("x", OutputKind::Result).text, "x");
    }
}
