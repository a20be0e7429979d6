//! Command handlers.
//!
//! Handlers parse CLI-specific input, call into the download pipeline and
//! format output for the terminal. They hold no pipeline logic of their own.

pub mod download;
pub mod inventory;
