//! Shared utilities.

pub mod labels;
