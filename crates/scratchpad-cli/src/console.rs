//! Console output handler.
//!
//! Prints scratch output to the terminal.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use scratchpad_core::{OutputHandler, OutputKind, ScratchFile, ScratchOutput};

use crate::colors;

/// Prints run events to stdout/stderr.
pub struct ConsoleHandler {
    started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        }
    }

    /// Errors reported since the last run started.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    fn elapsed_secs(&self) -> Option<f64> {
        let started = self.started.lock().ok()?;
        started.as_ref().map(|s| s.elapsed().as_secs_f64())
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHandler for ConsoleHandler {
    fn on_start(&self, file: &ScratchFile) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.errors.store(0, Ordering::SeqCst);

        println!(
            "\n{}Scratchpad{} - Running {}{}{}",
            colors::BOLD,
            colors::RESET,
            colors::CYAN,
            file.name(),
            colors::RESET
        );
        println!("{}", colors::rule());
        colors::flush_stdout();
    }

    fn handle(&self, _file: &ScratchFile, output: &ScratchOutput) {
        match output.kind {
            OutputKind::Stdout => println!("{}", output.text),
            OutputKind::Stderr => eprintln!("{}", colors::paint(colors::DIM, &output.text)),
            OutputKind::Result => println!("{} {}", colors::paint(colors::GREEN, "=>"), output.text),
        }
    }

    fn error(&self, _file: &ScratchFile, message: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        eprintln!("{}Error:{} {}", colors::RED, colors::RESET, message);
    }

    fn on_finish(&self, file: &ScratchFile) {
        println!("{}", colors::rule());
        let status = if self.error_count() == 0 {
            colors::paint(colors::GREEN, "Finished")
        } else {
            colors::paint(colors::YELLOW, "Finished with errors")
        };
        match self.elapsed_secs() {
            Some(secs) => println!("{} {} in {:.2}s", status, file.name(), secs),
            None => println!("{} {}", status, file.name()),
        }
        colors::flush_stdout();
    }
}
