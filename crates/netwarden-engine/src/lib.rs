//! Monitoring engine for netwarden
//!
//! [`Monitor`] ties enumeration, classification, the blocklist and capture
//! storage together behind the operations a control surface needs.

mod monitor;
mod output;

pub use monitor::*;
pub use output::*;
