//! netwarden core
//!
//! Core types, traits, configuration, and error handling shared by the
//! netwarden connection monitor.

pub mod config;
pub mod error;
pub mod record;
pub mod traits;

pub use config::*;
pub use error::{NetWardenError, Result};
pub use record::*;
pub use traits::*;
