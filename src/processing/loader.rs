use crate::error::{AppError, Result};
use crate::metrics::RECORDS_LOADED_TOTAL;
use crate::models::{CategoryRecord, MessageRecord};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// A message joined with one categories row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    pub message: MessageRecord,
    pub categories: String,
}

fn read_records<T: DeserializeOwned, R: Read>(reader: R, source: &str) -> Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let records = csv_reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;

    RECORDS_LOADED_TOTAL
        .with_label_values(&[source])
        .inc_by(records.len() as f64);
    Ok(records)
}

/// Read the messages CSV (`id,message,original,genre`)
pub fn load_messages(path: &Path) -> Result<Vec<MessageRecord>> {
    let file = std::fs::File::open(path)?;
    let records = read_records(file, "messages")?;
    tracing::info!(path = %path.display(), count = records.len(), "Messages loaded");
    Ok(records)
}

/// Read the categories CSV (`id,categories`)
pub fn load_categories(path: &Path) -> Result<Vec<CategoryRecord>> {
    let file = std::fs::File::open(path)?;
    let records = read_records(file, "categories")?;
    tracing::info!(path = %path.display(), count = records.len(), "Categories loaded");
    Ok(records)
}

/// Left-join messages with categories on `id`.
///
/// A message matching several categories rows yields one record per match,
/// in categories-file order. A message with no categories row is an error.
pub fn merge_records(
    messages: Vec<MessageRecord>,
    categories: Vec<CategoryRecord>,
) -> Result<Vec<MergedRecord>> {
    let mut by_id: HashMap<i64, Vec<String>> = HashMap::new();
    for record in categories {
        by_id.entry(record.id).or_default().push(record.categories);
    }

    let mut merged = Vec::with_capacity(messages.len());
    for message in messages {
        let matches = by_id
            .get(&message.id)
            .ok_or_else(|| AppError::data_quality(message.id, "no categories row for message"))?;

        for categories in matches {
            merged.push(MergedRecord {
                message: message.clone(),
                categories: categories.clone(),
            });
        }
    }

    tracing::debug!(rows = merged.len(), "Messages merged with categories");
    Ok(merged)
}
