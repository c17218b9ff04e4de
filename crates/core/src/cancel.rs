//! Broadcast cancellation for search runs.
//!
//! A closed channel is observable by any number of receivers at once, which
//! makes it a natural broadcast primitive: nothing is ever sent, the signal
//! is the closure itself.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

/// The signalling half. Dropping it (or calling [`CancelSource::cancel`])
/// notifies every clone of the paired [`Cancel`].
pub struct CancelSource {
    _tx: Sender<()>,
}

impl CancelSource {
    /// Signals cancellation by consuming the source.
    pub fn cancel(self) {}
}

/// The observing half, cloned into every worker of a search.
#[derive(Clone)]
pub struct Cancel {
    rx: Receiver<()>,
    // Keeps the channel open for tokens that must never fire.
    _keep: Option<Arc<Sender<()>>>,
}

impl Cancel {
    /// A token that never signals. Useful for direct calls to
    /// [`crate::GameState::sample`] outside a search.
    pub fn never() -> Self {
        let (tx, rx) = bounded(0);
        Cancel {
            rx,
            _keep: Some(Arc::new(tx)),
        }
    }

    /// True once the paired [`CancelSource`] is gone.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The underlying receiver, for use in `select!` arms.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

/// Creates a connected source/token pair.
pub fn cancel_pair() -> (CancelSource, Cancel) {
    let (tx, rx) = bounded(0);
    (CancelSource { _tx: tx }, Cancel { rx, _keep: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_cancelled_while_source_lives() {
        let (src, cancel) = cancel_pair();
        assert!(!cancel.is_cancelled());
        drop(src);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_cancel_reaches_every_clone() {
        let (src, cancel) = cancel_pair();
        let other = cancel.clone();
        src.cancel();
        assert!(cancel.is_cancelled());
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_never_does_not_fire() {
        let cancel = Cancel::never();
        let clone = cancel.clone();
        drop(cancel);
        assert!(!clone.is_cancelled());
    }
}
