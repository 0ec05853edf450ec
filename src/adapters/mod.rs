//! Adapters - implementations of the ports.

pub mod ai;
