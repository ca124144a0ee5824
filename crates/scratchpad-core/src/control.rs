//! The run control: the enabled state of whatever triggered a run.
//!
//! While a run is executing the control is disabled so the user cannot start
//! a second run of the same buffer.

use std::sync::Arc;

use tokio::sync::watch;

/// Enabled state of the control that triggered a run.
pub trait RunControl: Send + Sync {
    /// Whether the control is currently enabled.
    fn is_enabled(&self) -> bool;

    /// Enable or disable the control.
    fn set_enabled(&self, enabled: bool);
}

/// Cloneable run control backed by a watch channel.
///
/// Clones share state. Observers can [`subscribe`](ControlFlag::subscribe)
/// to be woken on every change.
#[derive(Clone)]
pub struct ControlFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl ControlFlag {
    /// Create an enabled control.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    /// Receive updates of the enabled state.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Wait until the control is enabled.
    pub async fn enabled(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|enabled| *enabled).await;
    }
}

impl Default for ControlFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl for ControlFlag {
    fn is_enabled(&self) -> bool {
        *self.tx.borrow()
    }

    fn set_enabled(&self, enabled: bool) {
        self.tx.send_replace(enabled);
    }
}
