//! High-level operations.
//!
//! This module contains the implementation of abi-conform commands.

pub mod conform;

pub use conform::{conform, format_report, ConformOptions, ConformReport};
