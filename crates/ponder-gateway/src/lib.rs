//! `OpenAI`-compatible chat completions gateway
//!
//! Decodes a request, resolves which strategy and backend model serve it,
//! runs the strategy, and reassembles its one-or-many answers into
//! ordered choices. Every failure is turned into a `{"error": message}`
//! response.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod error;
pub mod invoke;
pub mod protocol;
pub mod resolve;
pub mod response;
pub mod router;
pub mod translate;

pub use error::GatewayError;
pub use invoke::Invoker;
pub use resolve::ResolvedInvocation;
pub use router::{GatewayState, gateway_router};
pub use translate::ChatRequest;
