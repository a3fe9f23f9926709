// Core modules implementing the runtime handle, value marshalling, and error modeling.
pub mod config;
pub mod decoder;
pub mod error;
pub mod gate;
pub mod marshal;
#[cfg(feature = "python")]
pub mod python;
pub mod record;
pub mod request;
pub mod runtime;
