//! Shared fixtures for integration tests
//!
//! Writes small messages/categories CSVs into a temporary directory and
//! builds configurations sized for fast training runs.

#![allow(dead_code)]

use disaster_response_pipeline::config::PipelineConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MESSAGES_HEADER: &str = "id,message,original,genre";
pub const CATEGORIES_HEADER: &str = "id,categories";

/// Twenty messages labeled over related, water, food (plus the constant child_alone)
pub const CORPUS: [(i64, &str, [u8; 3]); 20] = [
    (1, "We need water in the village", [1, 1, 0]),
    (2, "Please send food to the shelter", [1, 0, 1]),
    (3, "Clean drinking water is running out", [1, 1, 0]),
    (4, "Children are hungry and need food", [1, 0, 1]),
    (5, "The weather is nice today", [0, 0, 0]),
    (6, "Send water and food to the camp", [1, 1, 1]),
    (7, "Is the hurricane over or not?", [0, 0, 0]),
    (8, "No water since the flood destroyed the pipes", [1, 1, 0]),
    (9, "We have no food left for the families", [1, 0, 1]),
    (10, "Looking for information about the concert", [0, 0, 0]),
    (11, "Bring water bottles to the school", [1, 1, 0]),
    (12, "Rice and beans are needed as food", [1, 0, 1]),
    (13, "RT check the news at http://example.com/storm", [0, 0, 0]),
    (14, "Water tanks are empty after the earthquake", [1, 1, 0]),
    (15, "Food distribution stopped at the church", [1, 0, 1]),
    (16, "Thank you for the music last night", [0, 0, 0]),
    (17, "People are thirsty, water please", [1, 1, 0]),
    (18, "The market has no food since the storm", [1, 0, 1]),
    (19, "Happy birthday to my friend", [0, 0, 0]),
    (20, "Water and food are both needed urgently", [1, 1, 1]),
];

/// Categories string for a corpus row; `related` is written as 2 on even ids
pub fn categories_string(id: i64, labels: [u8; 3]) -> String {
    let related = if labels[0] == 1 && id % 2 == 0 { 2 } else { labels[0] };
    format!(
        "related-{};water-{};child_alone-0;food-{}",
        related, labels[1], labels[2]
    )
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Write the messages and categories CSVs; returns their paths
pub fn write_csvs(
    dir: &Path,
    messages: &[(i64, &str)],
    categories: &[(i64, String)],
) -> (PathBuf, PathBuf) {
    let messages_path = dir.join("messages.csv");
    let categories_path = dir.join("categories.csv");

    let mut messages_csv = format!("{}\n", MESSAGES_HEADER);
    for (id, text) in messages {
        messages_csv.push_str(&format!("{},{},,direct\n", id, quote(text)));
    }
    let mut categories_csv = format!("{}\n", CATEGORIES_HEADER);
    for (id, categories) in categories {
        categories_csv.push_str(&format!("{},{}\n", id, categories));
    }

    std::fs::write(&messages_path, messages_csv).unwrap();
    std::fs::write(&categories_path, categories_csv).unwrap();
    (messages_path, categories_path)
}

/// Write the full corpus, with message 3 repeated as an exact duplicate
pub fn write_corpus(dir: &Path) -> (PathBuf, PathBuf) {
    let mut messages: Vec<(i64, &str)> = CORPUS.iter().map(|(id, text, _)| (*id, *text)).collect();
    let mut categories: Vec<(i64, String)> = CORPUS
        .iter()
        .map(|(id, _, labels)| (*id, categories_string(*id, *labels)))
        .collect();

    messages.push((CORPUS[2].0, CORPUS[2].1));
    categories.push((CORPUS[2].0, categories_string(CORPUS[2].0, CORPUS[2].2)));
    write_csvs(dir, &messages, &categories)
}

/// Create a temp directory holding the corpus CSVs
pub fn corpus_dir() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let (messages, categories) = write_corpus(temp_dir.path());
    (temp_dir, messages, categories)
}

/// Defaults with a small grid and two folds
pub fn fast_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.training.cv_folds = 2;
    config.training.learning_rates = vec![0.5, 1.0];
    config.training.n_estimators = vec![5, 10];
    config
}

/// Parse Prometheus exposition text into metric name -> sample lines
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                current_metric = parts[2].to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    metrics
}
