//! LLM backends behind the `kubeclaw_core::Provider` trait.
//!
//! [`build_from_config`] picks the backend named by `default_provider`.

pub mod anthropic;
mod http;
pub mod openai_compat;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
