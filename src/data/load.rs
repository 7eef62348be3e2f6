//! Loading delimited feature matrices and label files.

use ndarray::Array2;
use std::fs;
use std::path::Path;

use super::dataset::Dataset;
use crate::error::{Error, Result};

/// Load a dataset from delimited text files
///
/// The feature file is a comma-delimited numeric matrix, one example per
/// row; the label file holds one integer per row in the same order. The
/// test pair is optional but must be supplied together.
pub fn load_dataset(
    train_feat: &Path,
    train_label: &Path,
    test_feat: Option<&Path>,
    test_label: Option<&Path>,
) -> Result<Dataset> {
    let train_x = read_feature_matrix(train_feat)?;
    let train_y = read_labels(train_label)?;

    let test = match (test_feat, test_label) {
        (Some(feat), Some(label)) => Some((read_feature_matrix(feat)?, read_labels(label)?)),
        (None, None) => None,
        _ => {
            return Err(Error::InvalidConfig(
                "test features and test labels must be supplied together".to_string(),
            ))
        }
    };

    Dataset::from_raw(train_x, train_y, test)
}

fn parse_error(path: &Path, reason: impl Into<String>) -> Error {
    Error::Parse { path: path.display().to_string(), reason: reason.into() }
}

/// Read a comma-delimited numeric matrix, enforcing a uniform column count
pub fn read_feature_matrix(path: &Path) -> Result<Array2<f32>> {
    let content = fs::read_to_string(path)?;
    let mut rows: Vec<Vec<f32>> = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split(',')
            .map(|field| {
                field.trim().parse::<f32>().map_err(|e| {
                    parse_error(path, format!("line {}: {e}", line_no + 1))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(parse_error(
                    path,
                    format!(
                        "line {}: expected {} columns, found {}",
                        line_no + 1,
                        first.len(),
                        row.len()
                    ),
                ));
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(parse_error(path, "no data rows"));
    }

    let n_cols = rows[0].len();
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), n_cols), flat)
        .map_err(|e| parse_error(path, e.to_string()))
}

/// Read one integer label per line
pub fn read_labels(path: &Path) -> Result<Vec<i64>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            line.trim().parse::<i64>().map_err(|e| {
                parse_error(path, format!("line {}: {e}", line_no + 1))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("temp file creation should succeed");
        f.write_all(content.as_bytes()).expect("temp file write should succeed");
        f
    }

    #[test]
    fn test_load_train_only() {
        let feat = write_file("1.0,2.0\n3.0,4.0\n5.0,6.0\n");
        let label = write_file("2\n3\n2\n");

        let ds = load_dataset(feat.path(), label.path(), None, None).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.n_classes(), 2);
        assert_eq!(ds.train_y, vec![0, 1, 0]);
        assert!(ds.test_x.is_none());
    }

    #[test]
    fn test_load_with_test_partition() {
        let feat = write_file("1.0,2.0\n3.0,4.0\n");
        let label = write_file("1\n2\n");
        let tfeat = write_file("5.0,6.0\n");
        let tlabel = write_file("2\n");

        let ds = load_dataset(feat.path(), label.path(), Some(tfeat.path()), Some(tlabel.path()))
            .unwrap();
        assert_eq!(ds.test_y.unwrap(), vec![1]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let feat = write_file("1.0,2.0\n3.0\n");
        assert!(matches!(
            read_feature_matrix(feat.path()),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_non_numeric_field_rejected() {
        let feat = write_file("1.0,abc\n");
        assert!(read_feature_matrix(feat.path()).is_err());
    }

    #[test]
    fn test_test_paths_must_come_in_pairs() {
        let feat = write_file("1.0\n");
        let label = write_file("0\n");
        let tfeat = write_file("2.0\n");
        assert!(load_dataset(feat.path(), label.path(), Some(tfeat.path()), None).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let label = write_file("0\n");
        let result = load_dataset(Path::new("no_such_file.csv"), label.path(), None, None);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let feat = write_file("1.0,2.0\n\n3.0,4.0\n");
        let matrix = read_feature_matrix(feat.path()).unwrap();
        assert_eq!(matrix.nrows(), 2);
    }
}
