use nalgebra::DMatrix;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    Shape {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Malformed table '{path}': {message}")]
    Malformed { path: String, message: String },
}

/// The independent data partitions a table can be stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Train,
    Test,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Test => "test",
        }
    }
}

/// A table read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    pub feature_names: Vec<String>,
    pub ids: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

/// A file-backed record of feature matrices, keyed by partition and table.
///
/// Each `(partition, table)` pair maps to one CSV file with rows of
/// `[identifier, feature..., target]` under a header built from the feature
/// names. Train and test partitions live in separate directories so neither
/// can contaminate the other. The store is a cache/record, never the source
/// of truth; callers decide whether a write failure matters.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    root: PathBuf,
    name: String,
}

impl DescriptorStore {
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }

    fn table_path(&self, partition: Partition, table: &str) -> PathBuf {
        self.root
            .join(format!("{}_{}", partition.as_str(), self.name))
            .join(format!("{table}.csv"))
    }

    /// Writes a feature matrix with its identifiers and targets to a table,
    /// replacing any previous contents.
    pub fn write_table(
        &self,
        partition: Partition,
        table: &str,
        ids: &[String],
        matrix: &DMatrix<f64>,
        targets: &[f64],
        feature_names: &[String],
    ) -> Result<PathBuf, StoreError> {
        if ids.len() != matrix.nrows() {
            return Err(StoreError::Shape {
                what: "identifiers",
                expected: matrix.nrows(),
                found: ids.len(),
            });
        }
        if targets.len() != matrix.nrows() {
            return Err(StoreError::Shape {
                what: "targets",
                expected: matrix.nrows(),
                found: targets.len(),
            });
        }
        if feature_names.len() != matrix.ncols() {
            return Err(StoreError::Shape {
                what: "feature names",
                expected: matrix.ncols(),
                found: feature_names.len(),
            });
        }

        let path = self.table_path(partition, table);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(&path, e))?;
        }

        let mut writer = csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))?;
        let mut header = Vec::with_capacity(feature_names.len() + 2);
        header.push("id".to_string());
        header.extend(feature_names.iter().cloned());
        header.push("target".to_string());
        writer.write_record(&header).map_err(|e| csv_error(&path, e))?;

        for i in 0..matrix.nrows() {
            let mut record = Vec::with_capacity(header.len());
            record.push(ids[i].clone());
            for j in 0..matrix.ncols() {
                record.push(matrix[(i, j)].to_string());
            }
            record.push(targets[i].to_string());
            writer.write_record(&record).map_err(|e| csv_error(&path, e))?;
        }
        writer.flush().map_err(|e| io_error(&path, e))?;
        Ok(path)
    }

    /// Reads a previously written table back.
    pub fn read_table(&self, partition: Partition, table: &str) -> Result<StoredTable, StoreError> {
        let path = self.table_path(partition, table);
        let mut reader = csv::Reader::from_path(&path).map_err(|e| csv_error(&path, e))?;

        let header = reader.headers().map_err(|e| csv_error(&path, e))?.clone();
        if header.len() < 2 || header.get(0) != Some("id") {
            return Err(malformed(&path, "header must start with 'id'"));
        }
        if header.get(header.len() - 1) != Some("target") {
            return Err(malformed(&path, "header must end with 'target'"));
        }
        let feature_names: Vec<String> = header
            .iter()
            .skip(1)
            .take(header.len() - 2)
            .map(String::from)
            .collect();

        let mut ids = Vec::new();
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(&path, e))?;
            if record.len() != header.len() {
                return Err(malformed(&path, "row width differs from header"));
            }
            ids.push(record[0].to_string());
            let mut row = Vec::with_capacity(feature_names.len());
            for field in record.iter().skip(1).take(feature_names.len()) {
                row.push(parse_value(&path, field)?);
            }
            rows.push(row);
            targets.push(parse_value(&path, &record[record.len() - 1])?);
        }

        Ok(StoredTable {
            feature_names,
            ids,
            rows,
            targets,
        })
    }
}

fn parse_value(path: &Path, field: &str) -> Result<f64, StoreError> {
    field
        .parse::<f64>()
        .map_err(|e| malformed(path, &format!("bad numeric field '{field}': {e}")))
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> StoreError {
    StoreError::Csv {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

fn malformed(path: &Path, message: &str) -> StoreError {
    StoreError::Malformed {
        path: path.to_string_lossy().to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> (Vec<String>, DMatrix<f64>, Vec<f64>, Vec<String>) {
        let ids = vec!["a".to_string(), "b".to_string()];
        let matrix = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let targets = vec![0.1, 0.2];
        let names = vec!["f0".to_string(), "f1".to_string(), "f2".to_string()];
        (ids, matrix, targets, names)
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let store = DescriptorStore::new(dir.path(), "fpv_store");
        let (ids, matrix, targets, names) = sample();

        store
            .write_table(Partition::Train, "OriginalFeatureSpace", &ids, &matrix, &targets, &names)
            .unwrap();
        let table = store.read_table(Partition::Train, "OriginalFeatureSpace").unwrap();

        assert_eq!(table.feature_names, names);
        assert_eq!(table.ids, ids);
        assert_eq!(table.targets, targets);
        assert_eq!(table.rows[1], vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn train_and_test_partitions_are_independent() {
        let dir = tempdir().unwrap();
        let store = DescriptorStore::new(dir.path(), "fpv_store");
        let (ids, matrix, targets, names) = sample();

        store
            .write_table(Partition::Train, "t", &ids, &matrix, &targets, &names)
            .unwrap();
        let test_ids = vec!["x".to_string(), "y".to_string()];
        store
            .write_table(Partition::Test, "t", &test_ids, &matrix, &targets, &names)
            .unwrap();

        assert_eq!(store.read_table(Partition::Train, "t").unwrap().ids, ids);
        assert_eq!(store.read_table(Partition::Test, "t").unwrap().ids, test_ids);
    }

    #[test]
    fn shape_mismatches_are_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let store = DescriptorStore::new(dir.path(), "fpv_store");
        let (ids, matrix, targets, names) = sample();

        let short_ids = vec!["a".to_string()];
        assert!(matches!(
            store.write_table(Partition::Train, "t", &short_ids, &matrix, &targets, &names),
            Err(StoreError::Shape { what: "identifiers", .. })
        ));
        let short_names = names[..2].to_vec();
        assert!(matches!(
            store.write_table(Partition::Train, "t", &ids, &matrix, &targets, &short_names),
            Err(StoreError::Shape { what: "feature names", .. })
        ));
    }

    #[test]
    fn reading_a_missing_table_fails() {
        let dir = tempdir().unwrap();
        let store = DescriptorStore::new(dir.path(), "fpv_store");
        assert!(store.read_table(Partition::Train, "nope").is_err());
    }
}
