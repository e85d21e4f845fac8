//! Shared setup for the `batchenc-worker` and `batchenc-multi` binaries.

pub mod multi;
pub mod setup;
