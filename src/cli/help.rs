//! Help message display for CLI.

#![allow(clippy::print_stdout)]

use crate::config::Config;

/// Print help message based on configuration state.
pub fn print_smart_help(config: &Config) {
    if config.models.is_empty() {
        print_first_time_help();
    } else {
        print_configured_help();
    }
}

/// Print detailed setup guide for first-time users.
pub fn print_first_time_help() {
    println!("No model configured. Get started with plantdoc:");
    println!();
    println!("1. Initialize configuration:");
    println!("   plantdoc config init");
    println!();
    println!("2. Add an ONNX leaf disease model and its labels file (one label per line):");
    println!();
    println!("   [models.leaf]");
    println!("   path = \"/path/to/leaf.onnx\"");
    println!("   labels = \"/path/to/labels.txt\"");
    println!();
    println!("   [defaults]");
    println!("   model = \"leaf\"");
    println!();
    println!("3. Classify a photo:");
    println!("   plantdoc leaf.jpg");
    println!();
    println!("Try the pipeline without a model: plantdoc --dry-run leaf.jpg");
    println!("Run 'plantdoc -h' for all options.");
}

/// Print brief usage reminder for configured users.
pub fn print_configured_help() {
    println!("Usage: plantdoc [IMAGES]... [OPTIONS]");
    println!();
    println!("Example: plantdoc leaf.jpg --lat 36.88 --lon 30.70");
    println!();
    println!("Run 'plantdoc -h' for all options or 'plantdoc history list' to see past predictions.");
}
