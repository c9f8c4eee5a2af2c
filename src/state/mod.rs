pub mod store;
pub mod sled_store;

pub use store::*;
pub use sled_store::SledStore;

use crate::error::Result;
use crate::models::{CategorySchema, LabeledMessage};

/// A labeled table read back from a store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    pub schema: CategorySchema,
    pub rows: Vec<LabeledMessage>,
}

/// Trait for labeled-message table storage
pub trait MessageStore: Send + Sync {
    /// Replace `table` with `rows`, dropping any previous contents. Returns rows written.
    fn replace_table(
        &self,
        table: &str,
        schema: &CategorySchema,
        rows: &[LabeledMessage],
    ) -> Result<usize>;

    /// Load every row of `table` in insertion order
    fn load_table(&self, table: &str) -> Result<StoredTable>;

    /// Check whether `table` has been written
    fn table_exists(&self, table: &str) -> Result<bool>;
}
