//! Batch dispatching of encoding jobs.
//!
//! [`dispatcher::JobDispatcher`] drives a fixed list of jobs through a
//! [`backend::JobBackend`], keeping the remote queue filled up to a target
//! size and retrying failed jobs a bounded number of times.

pub mod backend;
pub mod dispatcher;
pub mod report;
