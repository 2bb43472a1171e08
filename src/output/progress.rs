//! Progress bar utilities for image classification.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for classifying multiple images.
pub fn create_image_progress(total_images: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total_images == 0 {
        return None;
    }

    let pb = ProgressBar::new(total_images as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} images {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    Some(pb)
}

/// Show the image currently being classified.
pub fn set_current(pb: Option<&ProgressBar>, name: &str) {
    if let Some(pb) = pb {
        pb.set_message(name.to_string());
    }
}

/// Print a line without tearing the progress bar.
#[allow(clippy::print_stdout)]
pub fn println(pb: Option<&ProgressBar>, line: &str) {
    match pb {
        Some(pb) => pb.suspend(|| println!("{line}")),
        None => println!("{line}"),
    }
}

/// Finish a progress bar with a message.
pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(message.to_string());
    }
}

/// Increment a progress bar.
pub fn inc_progress(pb: Option<&ProgressBar>) {
    if let Some(pb) = pb {
        pb.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_progress_is_none() {
        assert!(create_image_progress(3, false).is_none());
        assert!(create_image_progress(0, true).is_none());
    }

    #[test]
    fn test_progress_counts_images() {
        let pb = create_image_progress(2, true);
        inc_progress(pb.as_ref());
        assert_eq!(pb.as_ref().map(ProgressBar::position), Some(1));
        finish_progress(pb, "Complete");
    }
}
