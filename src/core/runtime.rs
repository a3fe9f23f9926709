//! Purpose: Seam between the decoder lifecycle and a concrete foreign runtime.
//! Exports: `ForeignRuntime`, `CallArgs`.
//! Role: `Decoder` drives any `ForeignRuntime`; the embedded interpreter is one implementation.
//! Invariants: `invoke` is only ever called with the decoder's gate held.
//! Invariants: `CallArgs` slots are replaced wholesale on every load.
use crate::core::error::Error;
use crate::core::record::DynamicRecord;

/// A resolved decode entry point inside some foreign runtime.
pub trait ForeignRuntime: Send {
    /// Calls the entry point with both argument slots and classifies the returned record.
    fn invoke(&mut self, args: &CallArgs) -> Result<DynamicRecord, Error>;

    /// Drops every runtime reference held. `Decoder` calls this at most once.
    fn release(&mut self);
}

/// Reusable two-slot positional argument holder: `(body, padding)`.
///
/// Only the host-side buffer is reused. A runtime may still build its own
/// argument objects per call; the embedded interpreter does, since its tuples
/// are immutable.
#[derive(Debug, Default)]
pub struct CallArgs {
    body: String,
    padding: u8,
    loaded: bool,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces both slots. The body buffer keeps its capacity across calls.
    pub fn load(&mut self, body: &str, padding: u8) {
        self.body.clear();
        self.body.push_str(body);
        self.padding = padding;
        self.loaded = true;
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn padding(&self) -> u8 {
        self.padding
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn clear(&mut self) {
        self.body = String::new();
        self.padding = 0;
        self.loaded = false;
    }
}
