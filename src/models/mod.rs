//! Core data models for mz-notify.
//!
//! Epistemic mapping:
//! - K_i (Knowledge): Concrete types with compile-time guarantees
//! - B_i (Beliefs): Wrapped in Result/Option
//! - I^R (Resolvable): Config parameters
//! - I^B (Bounded): Error variants with fallback strategies

mod config;
mod error;
mod event;
mod stats;

pub use config::*;
pub use error::*;
pub use event::*;
pub use stats::*;
