//! Purpose: Embedded-runtime AIS decoder core used by the `aiscdec` CLI, C ABI, and tests.
//! Exports: `api` (stable surface), `core` (lifecycle, marshalling, errors), `abi` (C bindings),
//!          `notice` (structured stderr notices), `stream` (line-delimited decode loop).
//! Role: Owns interpreter lifecycle and value marshalling; AIS bit decoding is delegated.
//! Invariants: Every call into the foreign runtime is serialized by the decoder's gate.
//! Invariants: No failure aborts the process; all of them surface as `core::error::Error`.
#[cfg(feature = "python")]
pub mod abi;
pub mod api;
pub mod core;
pub mod notice;
pub mod stream;
