pub mod categories;
pub mod deduplication;
pub mod loader;
pub mod processor;

pub use categories::{expand_categories, parse_schema, parse_category_value};
pub use deduplication::DeduplicationEngine;
pub use loader::{load_categories, load_messages, merge_records, MergedRecord};
pub use processor::{EtlProcessor, EtlSummary};
