//! Node configuration
//!
//! Runtime-tunable settings sourced from environment variables, with
//! defaults chosen for test speed rather than production hardness.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
