//! Purpose: FIFO mutual-exclusion gate guarding every call into the foreign runtime.
//! Exports: `CallGate`, `GatePass`.
//! Role: Serializes decoders' runtime calls; optional bounded wait surfaces as `Busy`.
//! Invariants: At most one `GatePass` exists at a time; passes are granted in arrival order.
//! Invariants: A waiter that times out leaves the queue and wakes the others.
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::core::error::{Error, ErrorKind};

#[derive(Debug, Default)]
struct GateState {
    held: bool,
    next_ticket: u64,
    queue: VecDeque<u64>,
}

#[derive(Debug, Default)]
pub struct CallGate {
    state: Mutex<GateState>,
    ready: Condvar,
}

/// Proof of exclusive entry; released on drop.
#[derive(Debug)]
pub struct GatePass<'a> {
    gate: &'a CallGate,
}

impl CallGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for entry. `None` blocks indefinitely.
    pub fn enter(&self, timeout: Option<Duration>) -> Result<GatePass<'_>, Error> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.lock()?;
        let ticket = state.next_ticket;
        state.next_ticket = state.next_ticket.wrapping_add(1);
        state.queue.push_back(ticket);

        loop {
            if !state.held && state.queue.front() == Some(&ticket) {
                state.queue.pop_front();
                state.held = true;
                return Ok(GatePass { gate: self });
            }

            state = match deadline {
                None => self.ready.wait(state).map_err(|_| poisoned())?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        state.queue.retain(|queued| *queued != ticket);
                        drop(state);
                        self.ready.notify_all();
                        return Err(Error::new(ErrorKind::Busy)
                            .with_message("timed out waiting for the runtime lock"));
                    }
                    self.ready
                        .wait_timeout(state, deadline - now)
                        .map_err(|_| poisoned())?
                        .0
                }
            };
        }
    }

    /// Number of callers currently waiting for entry.
    pub fn waiting(&self) -> usize {
        self.state.lock().map(|state| state.queue.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _state = self.state.lock();
                    panic!("poisoning runtime gate");
                })
                .join()
        });
    }

    fn lock(&self) -> Result<MutexGuard<'_, GateState>, Error> {
        self.state.lock().map_err(|_| poisoned())
    }

    fn leave(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.held = false;
        drop(state);
        self.ready.notify_all();
    }
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        self.gate.leave();
    }
}

fn poisoned() -> Error {
    Error::new(ErrorKind::Internal).with_message("runtime gate lock poisoned")
}
