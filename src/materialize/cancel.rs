// src/materialize/cancel.rs
// =============================================================================
// A cooperative cancellation flag.
//
// main flips it from a Ctrl-C handler task; the materializer races every
// network call and back-off sleep against `cancelled()`.
// =============================================================================

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Cancellation {
    // The sender is kept alive by every clone, so receivers never see it closed
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once `cancel()` has been called (immediately if it already was).
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // Err only if the sender is gone, which `self` prevents
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}
