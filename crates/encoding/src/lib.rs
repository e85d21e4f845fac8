//! REST client library for the remote encoding service.
//!
//! Provides typed request/response models, the [`service::EncodingService`]
//! abstraction with its HTTP implementation [`api::EncodingApi`],
//! rendition-ladder configuration, and execute-and-wait helpers.

pub mod api;
pub mod error;
pub mod execute;
pub mod ladder;
pub mod models;
pub mod service;
