use crate::error::{AppError, Result};
use crate::metrics::ROWS_STORED_TOTAL;
use crate::models::{CategorySchema, LabeledMessage};
use crate::state::{MessageStore, StoredTable};
use sled::Db;
use std::path::Path;
use std::sync::Arc;

const SCHEMA_KEY: &[u8] = b"columns";

/// Persistent table store using Sled embedded database.
///
/// Each table is a tree of bincode rows keyed by big-endian row index; its
/// column names live under a single key in a companion `<table>__schema` tree.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
}

impl SledStore {
    /// Open (or create) a Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            AppError::Storage(format!("Failed to open Sled database: {}", e))
        })?;

        tracing::info!("Initialized Sled store at {:?}", path.as_ref());

        Ok(Self { db: Arc::new(db) })
    }

    fn schema_tree_name(table: &str) -> String {
        format!("{}__schema", table)
    }

    fn row_key(index: usize) -> [u8; 8] {
        (index as u64).to_be_bytes()
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl MessageStore for SledStore {
    fn replace_table(
        &self,
        table: &str,
        schema: &CategorySchema,
        rows: &[LabeledMessage],
    ) -> Result<usize> {
        let schema_tree_name = Self::schema_tree_name(table);
        self.db.drop_tree(table)?;
        self.db.drop_tree(schema_tree_name.as_bytes())?;

        let rows_tree = self.db.open_tree(table)?;
        let schema_tree = self.db.open_tree(schema_tree_name.as_bytes())?;

        let mut batch = sled::Batch::default();
        for (index, row) in rows.iter().enumerate() {
            batch.insert(&Self::row_key(index)[..], bincode::serialize(row)?);
        }
        rows_tree.apply_batch(batch)?;
        schema_tree.insert(SCHEMA_KEY, bincode::serialize(schema)?)?;

        self.flush()?;
        ROWS_STORED_TOTAL.inc_by(rows.len() as u64);

        tracing::debug!(table, rows = rows.len(), "Table replaced in Sled");
        Ok(rows.len())
    }

    fn load_table(&self, table: &str) -> Result<StoredTable> {
        if !self.table_exists(table)? {
            return Err(AppError::NotFound(format!("Table {} not found", table)));
        }

        let schema_tree = self.db.open_tree(Self::schema_tree_name(table).as_bytes())?;
        let schema: CategorySchema = match schema_tree.get(SCHEMA_KEY)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => {
                return Err(AppError::Storage(format!(
                    "Table {} has no stored schema",
                    table
                )))
            }
        };

        let rows_tree = self.db.open_tree(table)?;
        let rows = rows_tree
            .iter()
            .values()
            .map(|value| Ok(bincode::deserialize::<LabeledMessage>(&value?)?))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(table, rows = rows.len(), "Table loaded from Sled");
        Ok(StoredTable { schema, rows })
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let schema_tree_name = Self::schema_tree_name(table);
        Ok(self
            .db
            .tree_names()
            .iter()
            .any(|name| &name[..] == schema_tree_name.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SledStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    fn create_test_schema() -> CategorySchema {
        CategorySchema::new(vec!["related".to_string(), "water".to_string()])
    }

    fn create_test_row(id: i64, labels: Vec<u8>) -> LabeledMessage {
        LabeledMessage {
            id,
            message: format!("We need help {}", id),
            original: Some(format!("original {}", id)),
            genre: Some("direct".to_string()),
            labels,
        }
    }

    #[test]
    fn test_replace_and_load_table() {
        let (store, _temp_dir) = create_test_store();
        let rows: Vec<LabeledMessage> = (0..12)
            .map(|i| create_test_row(i, vec![1, (i % 2) as u8]))
            .collect();

        let written = store
            .replace_table("DisasterResponse_table", &create_test_schema(), &rows)
            .unwrap();
        assert_eq!(written, 12);

        let table = store.load_table("DisasterResponse_table").unwrap();
        assert_eq!(table.schema, create_test_schema());
        // big-endian keys keep insertion order past index 9
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn test_replace_drops_previous_rows() {
        let (store, _temp_dir) = create_test_store();
        let schema = create_test_schema();

        store
            .replace_table(
                "t",
                &schema,
                &[create_test_row(1, vec![1, 0]), create_test_row(2, vec![0, 0])],
            )
            .unwrap();
        store
            .replace_table("t", &schema, &[create_test_row(3, vec![1, 1])])
            .unwrap();

        let table = store.load_table("t").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].id, 3);
    }

    #[test]
    fn test_missing_table() {
        let (store, _temp_dir) = create_test_store();
        assert!(!store.table_exists("absent").unwrap());
        let err = store.load_table("absent").unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_empty_table_round_trip() {
        let (store, _temp_dir) = create_test_store();
        store.replace_table("t", &create_test_schema(), &[]).unwrap();
        assert!(store.table_exists("t").unwrap());
        assert!(store.load_table("t").unwrap().rows.is_empty());
    }

    #[test]
    fn test_persistence_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = SledStore::new(&path).unwrap();
            store
                .replace_table("t", &create_test_schema(), &[create_test_row(5, vec![0, 1])])
                .unwrap();
        }

        {
            let store = SledStore::new(&path).unwrap();
            let table = store.load_table("t").unwrap();
            assert_eq!(table.rows, vec![create_test_row(5, vec![0, 1])]);
        }
    }
}
