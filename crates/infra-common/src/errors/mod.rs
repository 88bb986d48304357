//! Error types shared across the infrastructure modules

pub mod types;

pub use types::{Error, Result};
