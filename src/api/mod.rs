//! Purpose: Define the stable public Rust API boundary for aiscdec.
//! Exports: Decoder lifecycle, request/record types, marshalling, and errors.
//! Role: Public, additive-only surface; internal module paths may move.
//! Invariants: Anything a binding or the CLI needs is reachable from here.

pub use crate::core::config::DecoderConfig;
pub use crate::core::decoder::{Decoder, DecoderState};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::marshal::to_json;
#[cfg(feature = "python")]
pub use crate::core::python::{PythonDecoder, PythonRuntime, create_decoder};
pub use crate::core::record::{DynamicKey, DynamicRecord, DynamicValue};
pub use crate::core::request::{DecodeRequest, MAX_PADDING, parse_line, parse_padding};
pub use crate::core::runtime::{CallArgs, ForeignRuntime};
