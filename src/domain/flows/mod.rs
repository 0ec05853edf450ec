//! Flows Domain Module
//!
//! A flow wraps one model task behind typed contracts.
//!
//! - **Contract**: declarative value constraints with full violation reports
//! - **Registry**: name to [`FlowDefinition`] lookup
//! - **Prompt**: deterministic prompt compilation from slots and context
//! - **Catalog**: the counselling flows shipped with the service

pub mod catalog;
pub mod contract;
mod errors;
pub mod prompt;
pub mod registry;

pub use contract::{Contract, ContractViolation, FieldType};
pub use errors::FlowError;
pub use prompt::{compile, retry_directive, PromptTemplate, SlotFormat};
pub use registry::{Fallback, FlowDefinition, FlowRegistry};
