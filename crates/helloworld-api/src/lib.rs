//! Helloworld API Library
//!
//! HTTP handlers, request extraction and application setup for greeting submissions.

pub mod constants;
pub mod error;
mod handlers;
pub mod multipart;
pub mod session;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
