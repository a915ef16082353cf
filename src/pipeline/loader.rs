//! Chunked, strictly sequential, fail-fast loading into a [`GraphStore`].
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::db::{GraphStore, WriteOperation};
use crate::error::PipelineError;

/// Outcome of one [`BatchLoader::load`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub records: usize,
    pub batches: usize,
}

pub struct BatchLoader<'s, S: GraphStore + ?Sized> {
    store: &'s mut S,
    batch_size: usize,
}

impl<'s, S: GraphStore + ?Sized> BatchLoader<'s, S> {
    /// A `batch_size` of zero is treated as one.
    pub fn new(store: &'s mut S, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Run each constraint statement; failures are logged and skipped.
    ///
    /// Returns how many statements succeeded.
    pub fn create_constraints(&mut self, statements: &[&str]) -> usize {
        let mut created = 0;
        for statement in statements {
            match self.store.run_constraint(statement) {
                Ok(()) => {
                    info!("Constraint created: {}", statement.trim());
                    created += 1;
                }
                Err(source) => {
                    let err = PipelineError::Constraint {
                        statement: statement.trim().to_string(),
                        source,
                    };
                    warn!("{err}");
                }
            }
        }
        created
    }

    /// Serialize `records`, check them against the operation's payload
    /// contract, then write them chunk by chunk.
    ///
    /// Stops at the first failing chunk; earlier chunks stay committed.
    pub fn load<T: Serialize>(
        &mut self,
        operation: &WriteOperation,
        records: &[T],
    ) -> Result<LoadReport, PipelineError> {
        info!("Starting {} insertion...", operation.name);
        let total = records.len();
        if total == 0 {
            info!("No {} records to insert.", operation.name);
            return Ok(LoadReport::default());
        }

        let mut values = Vec::with_capacity(total);
        for (index, record) in records.iter().enumerate() {
            let value = serde_json::to_value(record).map_err(|e| PipelineError::Schema {
                operation: operation.name,
                index,
                reason: e.to_string(),
            })?;
            operation.check_record(index, &value)?;
            values.push(value);
        }

        let batch_count = total.div_ceil(self.batch_size);
        for (n, chunk) in values.chunks(self.batch_size).enumerate() {
            let offset = n * self.batch_size;
            self.write_chunk(operation, chunk, offset)?;
            info!(
                "-> Batch {} of {batch_count} processed ({} items).",
                n + 1,
                chunk.len()
            );
        }

        Ok(LoadReport {
            records: total,
            batches: batch_count,
        })
    }

    fn write_chunk(
        &mut self,
        operation: &WriteOperation,
        chunk: &[Value],
        offset: usize,
    ) -> Result<(), PipelineError> {
        self.store.execute_write(operation, chunk).map_err(|source| {
            error!(
                "Error in {} batch starting at index {offset}. Stopping: {source}",
                operation.name
            );
            PipelineError::Transaction {
                operation: operation.name,
                offset,
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::{DERIVATION_UPSERT, NODE_CONSTRAINTS};
    use crate::db::models::DerivationEdge;
    use crate::error::StoreError;

    /// Records every chunk it receives; can fail on the n-th write.
    #[derive(Default)]
    struct RecordingStore {
        chunks: Vec<Vec<Value>>,
        fail_on: Option<usize>,
        constraints: Vec<String>,
    }

    impl GraphStore for RecordingStore {
        fn verify_connectivity(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn run_constraint(&mut self, statement: &str) -> Result<(), StoreError> {
            if self.constraints.iter().any(|s| s == statement) {
                return Err(StoreError::Backend("already exists".to_string()));
            }
            self.constraints.push(statement.to_string());
            Ok(())
        }

        fn execute_write(
            &mut self,
            _operation: &WriteOperation,
            batch: &[Value],
        ) -> Result<(), StoreError> {
            if self.fail_on == Some(self.chunks.len()) {
                return Err(StoreError::Backend("write rejected".to_string()));
            }
            self.chunks.push(batch.to_vec());
            Ok(())
        }
    }

    fn edges(n: usize) -> Vec<DerivationEdge> {
        (0..n)
            .map(|i| DerivationEdge {
                child_id: format!("c{i}"),
                parent_id: format!("p{i}"),
                relation_type: "Derivation".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_chunking() {
        let mut store = RecordingStore::default();
        let report = BatchLoader::new(&mut store, 4)
            .load(&DERIVATION_UPSERT, &edges(10))
            .unwrap();
        assert_eq!(report, LoadReport { records: 10, batches: 3 });

        let sizes: Vec<usize> = store.chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        // Chunks are submitted in input order.
        assert_eq!(store.chunks[1][0]["child_id"], "c4");
        assert_eq!(store.chunks[2][1]["child_id"], "c9");
    }

    #[test]
    fn test_even_division_last_chunk_is_full() {
        let mut store = RecordingStore::default();
        let report = BatchLoader::new(&mut store, 5)
            .load(&DERIVATION_UPSERT, &edges(10))
            .unwrap();
        assert_eq!(report.batches, 2);
        assert_eq!(store.chunks[1].len(), 5);
    }

    #[test]
    fn test_empty_input_is_noop() {
        let mut store = RecordingStore::default();
        let report = BatchLoader::new(&mut store, 5)
            .load(&DERIVATION_UPSERT, &edges(0))
            .unwrap();
        assert_eq!(report, LoadReport::default());
        assert!(store.chunks.is_empty());
    }

    #[test]
    fn test_failure_aborts_remaining_chunks() {
        let mut store = RecordingStore {
            fail_on: Some(1),
            ..Default::default()
        };
        let err = BatchLoader::new(&mut store, 3)
            .load(&DERIVATION_UPSERT, &edges(9))
            .unwrap_err();
        match err {
            PipelineError::Transaction { offset, .. } => assert_eq!(offset, 3),
            other => panic!("unexpected error: {other}"),
        }
        // Only the chunk before the failure was written.
        assert_eq!(store.chunks.len(), 1);
    }

    #[test]
    fn test_contract_violation_writes_nothing() {
        #[derive(Serialize)]
        struct Wrong {
            child_id: String,
        }
        let mut store = RecordingStore::default();
        let records = vec![Wrong { child_id: "x".to_string() }];
        let err = BatchLoader::new(&mut store, 3)
            .load(&DERIVATION_UPSERT, &records)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Schema { index: 0, .. }));
        assert!(store.chunks.is_empty());
    }

    #[test]
    fn test_constraint_failures_are_not_fatal() {
        let mut store = RecordingStore::default();
        let mut loader = BatchLoader::new(&mut store, 10);
        assert_eq!(loader.create_constraints(NODE_CONSTRAINTS), NODE_CONSTRAINTS.len());
        assert_eq!(loader.create_constraints(NODE_CONSTRAINTS), 0);
        // Loading still works afterwards.
        assert!(loader.load(&DERIVATION_UPSERT, &edges(1)).is_ok());
    }
}
