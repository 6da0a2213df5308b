// src/config/mod.rs
//! Runtime configuration: scoring thresholds/rules and the optional model bundle.

pub mod scoring;

pub use scoring::{load_bundle_default, ScoringConfig};
