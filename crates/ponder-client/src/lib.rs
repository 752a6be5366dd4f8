//! Backend client for the language-model provider behind Ponder
//!
//! Strategies talk to the provider exclusively through the [`Backend`]
//! trait. [`OpenAiBackend`] implements it over any `OpenAI`-compatible
//! chat completions endpoint.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod backend;
pub mod error;
pub mod openai;
pub mod protocol;

pub use backend::{Backend, BackendRequest, BackendResponse, ChatMessage};
pub use error::BackendError;
pub use openai::{DEFAULT_BASE_URL, OpenAiBackend};
