use serde::{Deserialize, Serialize};

/// One row of the messages CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub message: String,
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

/// One row of the categories CSV: `name-value` fields joined by `;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub categories: String,
}

/// A message with one 0/1 label per schema category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledMessage {
    pub id: i64,
    pub message: String,
    pub original: Option<String>,
    pub genre: Option<String>,
    pub labels: Vec<u8>,
}

impl LabeledMessage {
    pub fn new(record: MessageRecord, labels: Vec<u8>) -> Self {
        Self {
            id: record.id,
            message: record.message,
            original: record.original,
            genre: record.genre,
            labels,
        }
    }

    /// Drop the label at `index`
    pub fn remove_label(&mut self, index: usize) {
        if index < self.labels.len() {
            self.labels.remove(index);
        }
    }
}

/// Ordered category names shared by every labeled row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySchema {
    names: Vec<String>,
}

impl CategorySchema {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    /// Remove a category by name, returning its former column index
    pub fn remove(&mut self, name: &str) -> Option<usize> {
        let index = self.index_of(name)?;
        self.names.remove(index);
        Some(index)
    }
}
