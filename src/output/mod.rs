//! Terminal output.

pub mod progress;
mod report;

pub use report::{format_location, format_prediction, one_line};
