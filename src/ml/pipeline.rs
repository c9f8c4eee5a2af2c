use crate::error::{AppError, Result};
use crate::ml::classifier::{Classifier, MultiLabelClassifier};
use crate::ml::features::{ComposedState, FeatureComposer, FeatureSettings};
use crate::ml::models::ModelMetadata;
use crate::ml::transform::Transformer;
use crate::nlp::LanguageResources;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Artifact layout version; bumped on incompatible changes
pub const FORMAT_VERSION: u32 = 2;

/// Feature state plus the classifier trained on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub feature_state: ComposedState,
    pub classifier: MultiLabelClassifier,
}

impl FittedPipeline {
    /// Featurize and classify messages
    pub fn predict(&self, composer: &FeatureComposer, messages: &[String]) -> Result<Array2<u8>> {
        let features = composer.transform(messages, &self.feature_state)?;
        self.classifier.predict(&features)
    }
}

/// Persisted model: everything needed to classify new messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    format_version: u32,
    pub metadata: ModelMetadata,
    pub settings: FeatureSettings,
    /// Fingerprint of the language resources the features were fitted with
    pub resources_fingerprint: String,
    pub fitted: FittedPipeline,
    pub category_names: Vec<String>,
}

impl TrainedPipeline {
    pub fn new(
        metadata: ModelMetadata,
        settings: FeatureSettings,
        resources_fingerprint: String,
        fitted: FittedPipeline,
        category_names: Vec<String>,
    ) -> Result<Self> {
        if fitted.classifier.n_labels() != category_names.len() {
            return Err(AppError::ShapeMismatch(format!(
                "classifier has {} labels but {} category names were given",
                fitted.classifier.n_labels(),
                category_names.len()
            )));
        }
        Ok(Self {
            format_version: FORMAT_VERSION,
            metadata,
            settings,
            resources_fingerprint,
            fitted,
            category_names,
        })
    }

    /// Write the artifact to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        info!(path = %path.display(), model_id = %self.metadata.id, "Model saved");
        Ok(())
    }

    /// Read an artifact written by [`TrainedPipeline::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let pipeline: Self = bincode::deserialize_from(reader)?;
        if pipeline.format_version != FORMAT_VERSION {
            return Err(AppError::Serialization(format!(
                "model format version {} is not supported (expected {})",
                pipeline.format_version, FORMAT_VERSION
            )));
        }
        Ok(pipeline)
    }

    /// Fail unless `resources` is the document the model was trained with
    pub fn check_resources(&self, resources: &LanguageResources) -> Result<()> {
        if resources.fingerprint != self.resources_fingerprint {
            return Err(AppError::ResourcesUnavailable(format!(
                "model was trained with resources {} but {} were loaded",
                self.resources_fingerprint, resources.fingerprint
            )));
        }
        Ok(())
    }

    /// Classify unseen messages; one 0/1 column per category
    pub fn predict_messages(
        &self,
        resources: Arc<LanguageResources>,
        messages: &[String],
    ) -> Result<Array2<u8>> {
        self.check_resources(&resources)?;
        let composer = FeatureComposer::new(resources, &self.settings)?;
        self.fitted.predict(&composer, messages)
    }

    /// Names of the categories predicted for each message
    pub fn predicted_categories(&self, predictions: &Array2<u8>) -> Vec<Vec<&str>> {
        predictions
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(&self.category_names)
                    .filter(|(&value, _)| value == 1)
                    .map(|(_, name)| name.as_str())
                    .collect()
            })
            .collect()
    }
}
