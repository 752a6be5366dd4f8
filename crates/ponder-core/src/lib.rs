//! Shared primitives for the Ponder gateway crates

mod error;

pub use error::{HttpError, error_body};
