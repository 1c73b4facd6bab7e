//! Column storage contract.
//!
//! A column store maps `(record id, column name)` to a one-dimensional
//! [`Sequence`]. How a store lays columns out on disk is its own business;
//! callers only see sequences. [`MemoryColumnStore`] keeps everything in
//! memory and is what tests and in-process pipelines use.

use std::collections::BTreeMap;

use crate::error::{Result, VerityError};
use crate::sequence::Sequence;

/// Keyed access to per-record columns.
pub trait ColumnStore {
    /// Load one column of one record.
    fn load(&self, record_id: &str, column: &str) -> Result<Sequence>;

    /// Store one column of one record, replacing any previous value.
    fn save(&mut self, record_id: &str, column: &str, values: &Sequence) -> Result<()>;

    /// All record ids, sorted.
    fn records(&self) -> Vec<String>;

    /// Column names of one record, sorted.
    fn columns(&self, record_id: &str) -> Result<Vec<String>>;
}

/// In-memory [`ColumnStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryColumnStore {
    records: BTreeMap<String, BTreeMap<String, Sequence>>,
}

impl MemoryColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&self, record_id: &str) -> Result<&BTreeMap<String, Sequence>> {
        self.records
            .get(record_id)
            .ok_or_else(|| VerityError::NotFound(format!("record {record_id:?}")))
    }
}

impl ColumnStore for MemoryColumnStore {
    fn load(&self, record_id: &str, column: &str) -> Result<Sequence> {
        self.record(record_id)?
            .get(column)
            .cloned()
            .ok_or_else(|| VerityError::NotFound(format!("column {column:?} of record {record_id:?}")))
    }

    fn save(&mut self, record_id: &str, column: &str, values: &Sequence) -> Result<()> {
        if values.shape().len() != 1 {
            return Err(VerityError::shape(
                "a one-dimensional sequence",
                format!("shape {:?}", values.shape()),
            ));
        }
        self.records
            .entry(record_id.to_string())
            .or_default()
            .insert(column.to_string(), values.clone());
        Ok(())
    }

    fn records(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    fn columns(&self, record_id: &str) -> Result<Vec<String>> {
        Ok(self.record(record_id)?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare, Tolerance};

    #[test]
    fn save_then_load_compares_equal() {
        let mut store = MemoryColumnStore::new();
        let col = Sequence::float(vec![1.0, f64::NAN, 2.5]);
        store.save("run-1", "latency", &col).unwrap();

        let loaded = store.load("run-1", "latency").unwrap();
        assert!(compare(&loaded, &col, &Tolerance::exact()).matches);
        assert_eq!(store.records(), vec!["run-1".to_string()]);
        assert_eq!(store.columns("run-1").unwrap(), vec!["latency".to_string()]);
    }

    #[test]
    fn missing_keys_are_not_found() {
        let mut store = MemoryColumnStore::new();
        store.save("a", "x", &Sequence::int(vec![1])).unwrap();
        assert!(matches!(store.load("b", "x"), Err(VerityError::NotFound(_))));
        assert!(matches!(store.load("a", "y"), Err(VerityError::NotFound(_))));
        assert!(store.columns("b").is_err());
    }

    #[test]
    fn only_one_dimensional_sequences_are_stored() {
        let mut store = MemoryColumnStore::new();
        let grid = Sequence::int(vec![1, 2, 3, 4]).with_shape(vec![2, 2]).unwrap();
        assert!(store.save("a", "grid", &grid).is_err());
        assert!(store.is_empty());
    }
}
