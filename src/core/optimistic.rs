//! Optimistic updates with rollback
//!
//! A flow applies its local change immediately, performs the remote write, and
//! restores the captured snapshot if the write fails. While one write is in flight
//! for an item, further attempts on that item are dropped rather than queued, so
//! the rollback target can never be overwritten by an interleaved attempt.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::Result;

/// Outcome of an attempted mutation that was not rejected
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    /// The remote write succeeded (or was reconciled) and the local state stands
    Applied(T),
    /// Another mutation on the same item was still in flight; nothing changed
    Ignored,
}

impl<T> Mutation<T> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Mutation::Ignored)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Mutation::Applied(value) => Some(value),
            Mutation::Ignored => None,
        }
    }
}

/// Cooperative per-item guard: at most one remote mutation at a time
#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the item, or `None` if a mutation is already running
    pub fn try_begin(&self) -> Option<InFlightTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightTicket { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the in-flight claim when dropped
#[derive(Debug)]
pub struct InFlightTicket<'a> {
    guard: &'a InFlight,
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}

/// Run one optimistic mutation.
///
/// `capture` takes the snapshot, `apply` makes the local change, `remote` performs
/// the write and `rollback` restores the snapshot. On failure the snapshot is
/// restored exactly once and the remote error is returned. The ticket is held
/// until the remote call resolves.
pub async fn run_optimistic<Snap, T, Fut>(
    ticket: InFlightTicket<'_>,
    capture: impl FnOnce() -> Snap,
    apply: impl FnOnce(),
    remote: impl FnOnce() -> Fut,
    rollback: impl FnOnce(Snap),
) -> Result<Mutation<T>>
where
    Fut: Future<Output = Result<T>>,
{
    let snapshot = capture();
    apply();

    let outcome = remote().await;
    let result = match outcome {
        Ok(value) => Ok(Mutation::Applied(value)),
        Err(err) => {
            log::debug!("Remote write failed, rolling back: {}", err);
            rollback(snapshot);
            Err(err)
        }
    };
    drop(ticket);
    result
}

/// Element state shared between an event handler and its in-flight write.
/// The lock is never held across an await.
#[derive(Debug, Default)]
pub struct LocalState<S> {
    inner: Mutex<S>,
}

impl<S: Clone> LocalState<S> {
    pub fn new(state: S) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    pub fn get(&self) -> S {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, state: S) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
