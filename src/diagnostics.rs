//! Non-fatal diagnostics channel.
//!
//! Structural errors that still let the engine continue with a degraded
//! frame (dropped allocations, exhausted collision chains) are logged via
//! `log` *and* pushed onto this channel so a host that wants to react
//! (metrics, alerting) doesn't have to scrape logs.

use crossbeam_channel::{Receiver, Sender};

#[derive(Debug, Clone)]
pub enum DiagnosticEvent {
    FrameAllocationDropped { attempted: u32, succeeded: u32 },
    ChainBoundExceeded { bucket: u32 },
    GarbageCollected { freed_blocks: u32 },
}

pub struct Diagnostics {
    tx: Sender<DiagnosticEvent>,
    rx: Receiver<DiagnosticEvent>,
}

impl Diagnostics {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn emit(&self, event: DiagnosticEvent) {
        // an unbounded channel with no receiver draining it never blocks;
        // a full receiver (dropped) just means nobody is watching.
        let _ = self.tx.send(event);
    }

    /// Drains all currently-queued diagnostics without blocking.
    pub fn drain(&self) -> Vec<DiagnosticEvent> {
        self.rx.try_iter().collect()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_events_are_drained_in_order() {
        let diag = Diagnostics::new();
        diag.emit(DiagnosticEvent::GarbageCollected { freed_blocks: 3 });
        diag.emit(DiagnosticEvent::ChainBoundExceeded { bucket: 7 });
        let drained = diag.drain();
        assert_eq!(drained.len(), 2);
        assert!(diag.drain().is_empty());
    }
}
