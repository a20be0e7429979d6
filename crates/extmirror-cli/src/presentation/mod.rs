//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: no domain transforms.

pub mod progress;
pub mod report;

pub use progress::ProgressEmitter;
pub use report::{format_inventory, format_summary};
