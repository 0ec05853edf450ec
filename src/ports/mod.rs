//! Ports - interfaces to the outside world.
//!
//! The domain and application layers depend on these traits; adapters
//! provide the implementations.

mod ai_provider;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    RequestMetadata, TokenUsage,
};
