use crate::error::{AppError, Result};
use crate::models::{CategorySchema, LabeledMessage};
use crate::state::{MessageStore, StoredTable};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory table store (for testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, StoredTable>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageStore for InMemoryStore {
    fn replace_table(
        &self,
        table: &str,
        schema: &CategorySchema,
        rows: &[LabeledMessage],
    ) -> Result<usize> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| AppError::Internal("table lock poisoned".to_string()))?;
        tables.insert(
            table.to_string(),
            StoredTable {
                schema: schema.clone(),
                rows: rows.to_vec(),
            },
        );

        tracing::debug!(table, rows = rows.len(), "Table replaced");
        Ok(rows.len())
    }

    fn load_table(&self, table: &str) -> Result<StoredTable> {
        let tables = self
            .tables
            .read()
            .map_err(|_| AppError::Internal("table lock poisoned".to_string()))?;
        tables
            .get(table)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Table {} not found", table)))
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let tables = self
            .tables
            .read()
            .map_err(|_| AppError::Internal("table lock poisoned".to_string()))?;
        Ok(tables.contains_key(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_row(id: i64) -> LabeledMessage {
        LabeledMessage {
            id,
            message: format!("need water {}", id),
            original: None,
            genre: Some("direct".to_string()),
            labels: vec![1, 0],
        }
    }

    #[test]
    fn test_replace_and_load() {
        let store = InMemoryStore::new();
        let schema = CategorySchema::new(vec!["related".to_string(), "water".to_string()]);

        assert!(!store.table_exists("messages").unwrap());
        store
            .replace_table("messages", &schema, &[create_test_row(1), create_test_row(2)])
            .unwrap();
        store.replace_table("messages", &schema, &[create_test_row(3)]).unwrap();

        let table = store.load_table("messages").unwrap();
        assert_eq!(table.schema, schema);
        assert_eq!(table.rows, vec![create_test_row(3)]);
    }

    #[test]
    fn test_missing_table() {
        let store = InMemoryStore::new();
        let err = store.load_table("absent").unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }
}
