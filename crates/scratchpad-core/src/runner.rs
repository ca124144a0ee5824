//! Scratch run orchestration.
//!
//! [`ScratchRunner::run`] takes a run request from the moment the user
//! triggers it until execution has started:
//!
//! ```text
//! Idle
//!  └── Started            on_start delivered
//!       ├── AwaitingBuild        make-before-run with a known module
//!       │    └── AwaitingReadiness   host still indexing when the build ends
//!       └── Executing      control disabled, executor running
//!            └── Finished  control re-enabled (once)
//! ```
//!
//! Every outcome is reported through the provider's output handler. Nothing
//! escapes `run`: missing buffers and providers are silent no-ops, missing
//! executors and execution faults become `error` + `on_finish`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::build::BuildService;
use crate::control::RunControl;
use crate::host::HostReadiness;
use crate::output::{CompletionObserver, OutputHandler};
use crate::provider::{ProviderRegistry, ScratchProvider};
use crate::session::{RunMode, ScratchFile, ScratchSession};

/// Phase of a scratch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Started,
    AwaitingBuild,
    AwaitingReadiness,
    Executing,
    Finished,
}

impl RunPhase {
    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Idle, Started)
                | (Started, AwaitingBuild)
                | (Started, Executing)
                | (Started, Finished)
                | (AwaitingBuild, AwaitingReadiness)
                | (AwaitingBuild, Executing)
                | (AwaitingBuild, Finished)
                | (AwaitingReadiness, Executing)
                | (AwaitingReadiness, Finished)
                | (Executing, Finished)
        )
    }
}

/// Logs phase transitions of one session.
#[derive(Clone)]
struct PhaseTracker {
    session: Uuid,
    phase: Arc<Mutex<RunPhase>>,
}

impl PhaseTracker {
    fn new(session: Uuid) -> Self {
        Self {
            session,
            phase: Arc::new(Mutex::new(RunPhase::Idle)),
        }
    }

    fn advance(&self, next: RunPhase) {
        let mut phase = match self.phase.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !phase.can_advance_to(next) {
            tracing::warn!(
                "Session {}: unexpected transition {:?} -> {:?}",
                self.session,
                *phase,
                next
            );
        }
        tracing::debug!("Session {}: {:?} -> {:?}", self.session, *phase, next);
        *phase = next;
    }
}

/// Re-enables the control exactly once, whichever terminal event comes first.
struct ReleaseLatch {
    released: AtomicBool,
    control: Arc<dyn RunControl>,
    tracker: PhaseTracker,
}

impl ReleaseLatch {
    /// Claim the terminal event. Returns `false` if it was already claimed.
    fn claim(&self) -> bool {
        !self.released.swap(true, Ordering::SeqCst)
    }

    fn restore(&self) {
        self.control.set_enabled(true);
        self.tracker.advance(RunPhase::Finished);
    }
}

/// Drives scratch runs.
pub struct ScratchRunner {
    providers: ProviderRegistry,
    build: Arc<dyn BuildService>,
    host: Arc<dyn HostReadiness>,
}

impl ScratchRunner {
    pub fn new(
        providers: ProviderRegistry,
        build: Arc<dyn BuildService>,
        host: Arc<dyn HostReadiness>,
    ) -> Self {
        Self {
            providers,
            build,
            host,
        }
    }

    /// Registered providers.
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Run a scratch session.
    ///
    /// Returns once execution has started (or the run ended early). The end
    /// of execution is signalled through the provider's output handler.
    pub async fn run(&self, session: &ScratchSession, control: Arc<dyn RunControl>) {
        let Some(file) = session.resolve() else {
            tracing::debug!("Nothing to run: {} not resolvable", session.path().display());
            return;
        };

        let Some(provider) = self.providers.get(file.language()) else {
            tracing::debug!("No scratch provider for language {}", file.language());
            return;
        };

        let tracker = PhaseTracker::new(file.session_id());
        let handler = provider.output_handler();
        handler.on_start(&file);
        tracker.advance(RunPhase::Started);

        let options = file.options();
        tracing::debug!(
            "Run {}: make_before_run = {}, mode = {:?}",
            file.name(),
            options.make_before_run,
            options.mode
        );

        if let (true, Some(module)) = (options.make_before_run, &options.module) {
            tracker.advance(RunPhase::AwaitingBuild);

            let result = self.build.build(std::slice::from_ref(module)).await;
            if result.is_failure() {
                handler.error(
                    &file,
                    &format!("There were compilation errors in module {}", module),
                );
            }

            if self.host.is_indexing() {
                tracker.advance(RunPhase::AwaitingReadiness);
                self.host.when_ready().await;
            }
        }

        execute_scratch(provider.as_ref(), handler, &file, control, tracker);
    }
}

fn execute_scratch(
    provider: &dyn ScratchProvider,
    handler: Arc<dyn OutputHandler>,
    file: &ScratchFile,
    control: Arc<dyn RunControl>,
    tracker: PhaseTracker,
) {
    let executor = match file.options().mode {
        RunMode::Repl => provider.create_repl_executor(file),
        RunMode::Compile => provider.create_compiling_executor(file),
    };

    let Some(mut executor) = executor else {
        handler.error(file, &format!("Couldn't run {}", file.name()));
        handler.on_finish(file);
        tracker.advance(RunPhase::Finished);
        return;
    };

    tracker.advance(RunPhase::Executing);
    control.set_enabled(false);

    let latch = Arc::new(ReleaseLatch {
        released: AtomicBool::new(false),
        control,
        tracker,
    });

    executor.add_output_handler(handler.clone());
    let observer_latch = latch.clone();
    executor.add_output_handler(Arc::new(CompletionObserver::new(move || {
        if observer_latch.claim() {
            observer_latch.restore();
        }
    })));

    let fault = match panic::catch_unwind(AssertUnwindSafe(|| executor.execute())) {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(payload) => Some(panic_message(payload.as_ref())),
    };

    if let Some(fault) = fault {
        tracing::error!("Run of {} failed: {}", file.name(), fault);
        handler.error(file, "Exception occurred during run");
        if latch.claim() {
            handler.on_finish(file);
            latch.restore();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        use RunPhase::*;

        assert!(Idle.can_advance_to(Started));
        assert!(Started.can_advance_to(Executing));
        assert!(Started.can_advance_to(AwaitingBuild));
        assert!(AwaitingBuild.can_advance_to(AwaitingReadiness));
        assert!(AwaitingReadiness.can_advance_to(Executing));
        assert!(Executing.can_advance_to(Finished));

        assert!(!Idle.can_advance_to(Executing));
        assert!(!Finished.can_advance_to(Started));
        assert!(!Executing.can_advance_to(AwaitingBuild));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "panic: boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "panic: bang");

        let payload: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(payload.as_ref()), "panic with non-string payload");
    }

    #[test]
    fn test_latch_claims_once() {
        let control: Arc<dyn RunControl> = Arc::new(crate::control::ControlFlag::new());
        let latch = ReleaseLatch {
            released: AtomicBool::new(false),
            control,
            tracker: PhaseTracker::new(Uuid::new_v4()),
        };

        assert!(latch.claim());
        assert!(!latch.claim());
    }
}
