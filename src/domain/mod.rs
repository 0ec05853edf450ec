//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives
//! - `conversation` - Messages and the bounded context window
//! - `flows` - Flow contracts, prompt templates, registry and catalog
//! - `safety` - Risk levels, lexicon classifier and escalation routing

pub mod conversation;
pub mod flows;
pub mod foundation;
pub mod safety;
