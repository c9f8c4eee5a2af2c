//! Disaster-response message pipeline.
//!
//! Two offline stages: an ETL that merges the messages and categories CSVs
//! into a labeled table, and a trainer that fits a multi-label classifier
//! (TF-IDF plus a starting-verb feature, AdaBoost per category) under a
//! cross-validated grid search and persists it as one artifact.

pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod nlp;
pub mod observability;
pub mod processing;
pub mod state;

pub use config::PipelineConfig;
pub use error::{AppError, Result};
