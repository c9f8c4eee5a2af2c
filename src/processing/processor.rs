use crate::config::EtlConfig;
use crate::error::Result;
use crate::metrics::STAGE_DURATION_SECONDS;
use crate::models::{CategorySchema, LabeledMessage};
use crate::processing::categories::{expand_categories, parse_schema};
use crate::processing::loader::{load_categories, load_messages, merge_records, MergedRecord};
use crate::processing::DeduplicationEngine;
use crate::state::MessageStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Counts reported after an ETL run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EtlSummary {
    pub messages_loaded: usize,
    pub merged_rows: usize,
    pub duplicates_removed: usize,
    pub rows_stored: usize,
    pub categories: Vec<String>,
}

/// Main ETL processor: load, merge, clean and store labeled messages
pub struct EtlProcessor {
    store: Arc<dyn MessageStore>,
    dedup_engine: DeduplicationEngine,
    config: EtlConfig,
}

impl EtlProcessor {
    pub fn new(store: Arc<dyn MessageStore>, config: EtlConfig) -> Self {
        Self {
            store,
            dedup_engine: DeduplicationEngine::new(),
            config,
        }
    }

    /// Run the full ETL from two CSV files into the configured table
    pub fn run(&self, messages_path: &Path, categories_path: &Path) -> Result<EtlSummary> {
        let started = Instant::now();
        tracing::info!(
            messages = %messages_path.display(),
            categories = %categories_path.display(),
            "Loading data"
        );
        let messages = load_messages(messages_path)?;
        let categories = load_categories(categories_path)?;
        let messages_loaded = messages.len();
        let merged = merge_records(messages, categories)?;
        let merged_rows = merged.len();
        STAGE_DURATION_SECONDS
            .with_label_values(&["load"])
            .observe(started.elapsed().as_secs_f64());

        let started = Instant::now();
        tracing::info!("Cleaning data");
        let (schema, rows) = self.clean(merged)?;
        let duplicates_removed = merged_rows - rows.len();
        STAGE_DURATION_SECONDS
            .with_label_values(&["clean"])
            .observe(started.elapsed().as_secs_f64());

        let started = Instant::now();
        tracing::info!(table = %self.config.table_name, rows = rows.len(), "Saving data");
        let rows_stored = self
            .store
            .replace_table(&self.config.table_name, &schema, &rows)?;
        STAGE_DURATION_SECONDS
            .with_label_values(&["save"])
            .observe(started.elapsed().as_secs_f64());

        tracing::info!(
            rows_stored,
            categories = schema.len(),
            "Cleaned data saved to store"
        );

        Ok(EtlSummary {
            messages_loaded,
            merged_rows,
            duplicates_removed,
            rows_stored,
            categories: schema.names().to_vec(),
        })
    }

    /// Expand categories, drop duplicate rows, then drop excluded columns
    pub fn clean(&self, merged: Vec<MergedRecord>) -> Result<(CategorySchema, Vec<LabeledMessage>)> {
        let mut schema = match merged.first() {
            Some(first) => parse_schema(first.message.id, &first.categories)?,
            None => {
                tracing::warn!("No merged records; storing an empty table");
                CategorySchema::new(Vec::new())
            }
        };

        let rows = merged
            .into_iter()
            .map(|record| {
                let labels = expand_categories(record.message.id, &record.categories, &schema)?;
                Ok(LabeledMessage::new(record.message, labels))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rows = self.dedup_engine.deduplicate(rows);

        for excluded in &self.config.excluded_categories {
            match schema.remove(excluded) {
                Some(index) => {
                    for row in &mut rows {
                        row.remove_label(index);
                    }
                    tracing::debug!(category = %excluded, "Excluded category dropped");
                }
                None if schema.is_empty() => {}
                None => {
                    tracing::warn!(category = %excluded, "Excluded category not present in data");
                }
            }
        }

        Ok((schema, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRecord;
    use crate::state::InMemoryStore;

    fn create_test_config() -> EtlConfig {
        EtlConfig {
            table_name: "DisasterResponse_table".to_string(),
            excluded_categories: vec!["child_alone".to_string()],
        }
    }

    fn merged(id: i64, text: &str, categories: &str) -> MergedRecord {
        MergedRecord {
            message: MessageRecord {
                id,
                message: text.to_string(),
                original: None,
                genre: Some("direct".to_string()),
            },
            categories: categories.to_string(),
        }
    }

    #[test]
    fn test_clean_drops_child_alone_after_dedup() {
        let processor = EtlProcessor::new(Arc::new(InMemoryStore::new()), create_test_config());
        let records = vec![
            merged(1, "need water", "related-1;child_alone-0;water-2"),
            merged(1, "need water", "related-1;child_alone-0;water-1"),
            merged(2, "all good", "related-0;child_alone-0;water-0"),
        ];

        let (schema, rows) = processor.clean(records).unwrap();
        assert_eq!(schema.names(), &["related", "water"]);
        // 2 -> 1 makes the first two rows identical
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].labels, vec![1, 1]);
        assert_eq!(rows[1].labels, vec![0, 0]);
    }

    #[test]
    fn test_clean_without_excluded_column() {
        let processor = EtlProcessor::new(Arc::new(InMemoryStore::new()), create_test_config());
        let (schema, rows) = processor
            .clean(vec![merged(1, "help", "related-1;water-0")])
            .unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(rows[0].labels, vec![1, 0]);
    }

    #[test]
    fn test_clean_propagates_data_quality_error() {
        let processor = EtlProcessor::new(Arc::new(InMemoryStore::new()), create_test_config());
        let err = processor
            .clean(vec![
                merged(1, "a", "related-1;water-0"),
                merged(9, "b", "related-5;water-0"),
            ])
            .unwrap_err();
        assert_eq!(err.error_code(), "DATA_QUALITY_ERROR");
        assert!(err.to_string().contains("id 9"));
    }

    #[test]
    fn test_clean_empty_input() {
        let processor = EtlProcessor::new(Arc::new(InMemoryStore::new()), create_test_config());
        let (schema, rows) = processor.clean(Vec::new()).unwrap();
        assert!(schema.is_empty());
        assert!(rows.is_empty());
    }
}
