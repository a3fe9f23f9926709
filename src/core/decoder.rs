//! Purpose: Runtime handle owning a foreign decode session and its argument holder.
//! Exports: `Decoder`, `DecoderState`.
//! Role: Guarded call-in/call-out: gate -> state -> args -> invoke -> marshal -> release.
//! Invariants: Every runtime call happens with the gate held for its full duration.
//! Invariants: `Ready -> Destroyed` is one-way; decode after destroy never reaches the runtime.
//! Invariants: Guards release on every exit path, including errors.
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::config::DecoderConfig;
use crate::core::error::{Error, ErrorKind};
use crate::core::gate::CallGate;
use crate::core::marshal;
use crate::core::request::DecodeRequest;
use crate::core::runtime::{CallArgs, ForeignRuntime};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecoderState {
    Ready,
    Destroyed,
}

struct Session<R> {
    runtime: R,
    args: CallArgs,
}

pub struct Decoder<R: ForeignRuntime> {
    gate: CallGate,
    session: Mutex<Option<Session<R>>>,
    lock_timeout: Option<Duration>,
}

impl<R: ForeignRuntime> Decoder<R> {
    /// Wraps an already-resolved runtime. The decoder is `Ready` on return.
    pub fn start(runtime: R, config: &DecoderConfig) -> Self {
        Self {
            gate: CallGate::new(),
            session: Mutex::new(Some(Session {
                runtime,
                args: CallArgs::new(),
            })),
            lock_timeout: config.lock_timeout(),
        }
    }

    pub fn state(&self) -> DecoderState {
        match self.lock_session() {
            Ok(session) if session.is_some() => DecoderState::Ready,
            _ => DecoderState::Destroyed,
        }
    }

    pub fn decode(&self, body: &str, padding: u8) -> Result<Value, Error> {
        let _pass = self.gate.enter(self.lock_timeout)?;
        let mut guard = self.lock_session()?;
        let session = guard.as_mut().ok_or_else(|| {
            Error::new(ErrorKind::UseAfterDestroy).with_message("decoder has been destroyed")
        })?;

        if !body.is_ascii() {
            return Err(Error::new(ErrorKind::Usage).with_message("body must be ascii"));
        }

        session.args.load(body, padding);
        debug!(len = body.len(), padding, "invoking decode");
        let record = session.runtime.invoke(&session.args)?;
        marshal::to_json(record)
    }

    pub fn decode_request(&self, request: &DecodeRequest) -> Result<Value, Error> {
        self.decode(&request.body, request.padding)
    }

    /// Releases the runtime and argument holder. Returns `false` if already destroyed.
    pub fn destroy(&self) -> bool {
        // teardown proceeds without the gate when it is poisoned
        let _pass = match self.gate.enter(None) {
            Ok(pass) => Some(pass),
            Err(err) => {
                warn!(error = %err, "destroying decoder without the runtime gate");
                None
            }
        };
        let mut guard = match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.take() {
            Some(mut session) => {
                session.runtime.release();
                session.args.clear();
                info!("decoder destroyed");
                true
            }
            None => false,
        }
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Option<Session<R>>>, Error> {
        self.session.lock().map_err(|_| {
            Error::new(ErrorKind::Internal).with_message("decoder session lock poisoned")
        })
    }
}

impl<R: ForeignRuntime> Drop for Decoder<R> {
    fn drop(&mut self) {
        self.destroy();
    }
}
