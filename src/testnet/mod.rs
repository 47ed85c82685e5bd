//! Testing support for consensus scenarios
//!
//! Helpers for building funded genesis blocks, sealing blocks against easy
//! targets, and wiring small simulated networks.

pub mod test_utils;

pub use test_utils::*;
