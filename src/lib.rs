//! Campus Care - counselling flow orchestration with a risk-tiered safety pipeline
//!
//! Named flows turn structured input into validated JSON produced by a
//! language model. Every invocation is screened by a deterministic lexicon,
//! merged with the model's own risk report, and escalated when the combined
//! risk is high or critical.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
