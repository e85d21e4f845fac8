//! Domain types for batch encoding against a remote encoding service.
//!
//! Everything here is free of network I/O: the job model and its state
//! transitions, the layered configuration provider, output-path helpers
//! and the injectable [`pause::Pause`] seam used by the polling loops.

pub mod config;
pub mod error;
pub mod job;
pub mod paths;
pub mod pause;
pub mod types;
