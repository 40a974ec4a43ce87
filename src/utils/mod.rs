//! Shared utilities

pub mod error;
pub mod logging;

pub use error::{AppError, AppResult, ErrorResponse};
pub use logging::init_tracing;
