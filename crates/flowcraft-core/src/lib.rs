//! ABOUTME: Shared types, errors, and cross-crate contracts for the Flowcraft
//! ABOUTME: workflow compilation and execution engine

pub mod error;
pub mod traits;
pub mod types;

pub use error::{FlowError, Result};
