//! Completion backends for Taskweave.
//!
//! All backends implement the `taskweave_core::Provider` trait.
//! The router picks one per request from the backend selector.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
