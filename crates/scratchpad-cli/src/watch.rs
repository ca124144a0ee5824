//! Watch command implementation for Scratchpad CLI.
//!
//! Re-runs a scratch file whenever it changes. Changes that arrive while a
//! run is still executing are skipped.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use scratchpad_core::{ControlFlag, RunControl, RunOptions, ScratchSession};

use crate::colors;
use crate::host::ScratchHost;
use crate::run::RunArgs;
use crate::watcher::{FileEvent, FileWatcher};

/// Debounce window for editor save bursts.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Execute the watch command.
pub async fn execute(args: &RunArgs, clear_screen: bool) -> anyhow::Result<()> {
    let path = args.scratch_path()?;
    let target = args.run_target()?;
    let host = ScratchHost::new(&path, target.is_release())?;
    let options = args.options(target);

    let control = ControlFlag::new();
    let mut control_rx = control.subscribe();

    println!(
        "{}Watching {} for changes... (Ctrl+C to stop){}",
        colors::DIM,
        path.display(),
        colors::RESET
    );

    host.prepare(&options).await;
    run_once(&host, &path, &options, &control, clear_screen).await;

    let mut watcher = FileWatcher::new(&path, DEBOUNCE)?;

    loop {
        tokio::select! {
            event = watcher.recv() => {
                let Some(event) = event else {
                    break;
                };
                match event {
                    FileEvent::Modified(changed) => {
                        if !control.is_enabled() {
                            println!(
                                "{}{} changed while the previous run is in progress, skipped{}",
                                colors::YELLOW,
                                changed.display(),
                                colors::RESET
                            );
                            continue;
                        }
                        run_once(&host, &path, &options, &control, clear_screen).await;
                    }
                    FileEvent::Removed(removed) => {
                        eprintln!(
                            "\n{}Warning:{} Scratch file removed: {}",
                            colors::YELLOW,
                            colors::RESET,
                            removed.display()
                        );
                    }
                }
            }
            changed = control_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if *control_rx.borrow_and_update() {
                    println!("{}Waiting for changes...{}", colors::DIM, colors::RESET);
                }
            }
        }
    }

    Ok(())
}

/// Start one run. Returns once execution has started.
async fn run_once(
    host: &ScratchHost,
    path: &Path,
    options: &RunOptions,
    control: &ControlFlag,
    clear_screen: bool,
) {
    if clear_screen {
        clear_terminal();
    }
    let session = ScratchSession::new(path, options.clone());
    host.runner.run(&session, Arc::new(control.clone())).await;
}

/// Clear the terminal screen.
fn clear_terminal() {
    print!("\x1B[2J\x1B[1;1H");
    colors::flush_stdout();
}
