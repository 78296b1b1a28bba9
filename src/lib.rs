//! Randomised balanced group assignment.
//!
//! Given subjects with a measured size and a target group schema, score many
//! random partitions and keep the one whose groups are statistically
//! indistinguishable and internally tight.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod report;
pub mod workbook;

pub use error::{Error, Result};
