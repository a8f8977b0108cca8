//! # Campaign Synchronization Primitives
//!
//! Two small, independently synchronized signals the scheduler shares with
//! its lanes and callers:
//!
//! * [`CancellationSignal`]: a resettable latch polled by in-flight probes.
//! * [`QuiescenceGate`]: open while no probe is executing; callers can await it
//!   to learn that a cancellation has fully drained.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// A cloneable handle to one cancellation latch.
///
/// Unlike a one-shot token, the latch can be cleared between campaigns.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    canceled: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Calling it again has no further effect.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Clears the latch. Only valid while no lane is active.
    pub fn reset(&self) {
        self.canceled.store(false, Ordering::SeqCst);
    }
}

/// Manual-reset "no work in flight" signal.
///
/// Once opened it stays open until explicitly closed again, so a waiter that
/// arrives late still observes the open state.
#[derive(Debug)]
pub struct QuiescenceGate {
    state: watch::Sender<bool>,
}

impl Default for QuiescenceGate {
    fn default() -> Self {
        Self::new()
    }
}

impl QuiescenceGate {
    /// Creates an open gate: a fresh campaign has nothing in flight.
    pub fn new() -> Self {
        let (state, _) = watch::channel(true);
        Self { state }
    }

    /// Marks work as in flight.
    pub fn close(&self) {
        self.state.send_replace(false);
    }

    /// Marks that nothing is in flight and releases every waiter.
    pub fn open(&self) {
        self.state.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the gate is open.
    pub async fn wait(&self) {
        let mut rx: watch::Receiver<bool> = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|open| *open).await;
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
