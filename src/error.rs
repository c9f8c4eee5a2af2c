use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Structured store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed input records
    #[error("Data quality error (id {id}): {message}")]
    DataQuality { id: i64, message: String },

    /// Linguistic resources could not be loaded
    #[error("Language resources unavailable: {0}")]
    ResourcesUnavailable(String),

    /// Vectorizer fit on a corpus that produced no tokens
    #[error("Empty vocabulary: the fit corpus produced no tokens")]
    EmptyVocabulary,

    /// Transform or predict called before fit
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// Matrix dimensions disagree
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Every grid point failed during hyperparameter search
    #[error("No viable configuration: {0}")]
    NoViableConfiguration(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Io(_) => "IO_ERROR",
            AppError::Csv(_) => "CSV_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DataQuality { .. } => "DATA_QUALITY_ERROR",
            AppError::ResourcesUnavailable(_) => "RESOURCES_UNAVAILABLE",
            AppError::EmptyVocabulary => "EMPTY_VOCABULARY",
            AppError::NotFitted(_) => "NOT_FITTED",
            AppError::ShapeMismatch(_) => "SHAPE_MISMATCH",
            AppError::NoViableConfiguration(_) => "NO_VIABLE_CONFIGURATION",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for a data-quality error on a given record
    pub fn data_quality(id: i64, message: impl Into<String>) -> Self {
        AppError::DataQuality {
            id,
            message: message.into(),
        }
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err.to_string())
    }
}

/// Conversion from sled::Error
impl From<sled::Error> for AppError {
    fn from(err: sled::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from toml::de::Error
impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ResourcesUnavailable(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
