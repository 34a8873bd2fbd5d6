//! Completion providers
//!
//! The language model is an unreliable external dependency. Providers implement
//! [`CompletionProvider`]; [`ModelRouter`] composes several of them for failover.
//! Callers that must never fail on a completion use [`complete_or_demo`].

pub mod openai_compat;
pub mod router;
pub mod types;

pub use openai_compat::OpenAiCompatProvider;
pub use router::ModelRouter;
pub use types::{CompletionProvider, DEMO_MODE_MARKER, complete_or_demo, demo_response};
