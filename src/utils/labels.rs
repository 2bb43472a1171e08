//! Labels file reading utilities.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read class labels from file.
///
/// # File Format
/// - One label per line, in the order of the model's output vector
/// - Leading and trailing whitespace is trimmed
/// - Blank lines are ignored
pub fn read_labels(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let reader = BufReader::new(file);
    let mut labels = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| Error::LabelsRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let trimmed = line.trim();
        if !trimmed.is_empty() {
            labels.push(trimmed.to_string());
        }
    }

    Ok(labels)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_labels_keeps_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Apple___Apple_scab").unwrap();
        writeln!(file, "  Apple___healthy  ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Tomato___Late_blight").unwrap();

        let labels = read_labels(file.path()).unwrap();
        assert_eq!(
            labels,
            vec![
                "Apple___Apple_scab",
                "Apple___healthy",
                "Tomato___Late_blight"
            ]
        );
    }

    #[test]
    fn test_read_labels_file_not_found() {
        assert!(matches!(
            read_labels(Path::new("nonexistent-labels.txt")),
            Err(Error::LabelsRead { .. })
        ));
    }
}
