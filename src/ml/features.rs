use crate::config::PipelineConfig;
use crate::error::{AppError, Result};
use crate::ml::sparse::SparseMatrix;
use crate::ml::transform::Transformer;
use crate::nlp::{LanguageResources, PosTagger, SentenceSplitter, Tokenizer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Settings that shape feature extraction, persisted with a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// Token substituted for URLs
    pub url_placeholder: String,

    /// Lowercase text before count vectorization
    pub lowercase: bool,
}

impl FeatureSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            url_placeholder: config.nlp.url_placeholder.clone(),
            lowercase: config.training.lowercase,
        }
    }
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Whether a message's first sentence opens with a verb (or a retweet marker)
#[derive(Debug, Clone)]
pub struct StartingVerbFeature {
    tokenizer: Tokenizer,
    sentences: SentenceSplitter,
    tagger: PosTagger,
}

impl StartingVerbFeature {
    pub fn new(resources: Arc<LanguageResources>, tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            sentences: SentenceSplitter::new(resources.clone()),
            tagger: PosTagger::new(resources),
        }
    }

    /// Evaluate a single message
    pub fn starts_with_verb(&self, text: &str) -> bool {
        let sentences = self.sentences.split(text);
        let Some(first) = sentences.first() else {
            return false;
        };

        let tokens = self.tokenizer.tokenize(first);
        if tokens.is_empty() {
            return false;
        }

        let tags = self.tagger.tag(&tokens);
        if tags.first().map_or(false, |tag| tag.is_base_or_present_verb()) {
            return true;
        }

        self.tokenizer
            .words(first)
            .first()
            .map_or(false, |word| word == "RT")
    }
}

impl Transformer for StartingVerbFeature {
    type State = ();
    type Output = Vec<bool>;

    fn fit(&self, _messages: &[String]) -> Result<()> {
        Ok(())
    }

    fn transform(&self, messages: &[String], _state: &()) -> Result<Vec<bool>> {
        Ok(messages
            .par_iter()
            .map(|message| self.starts_with_verb(message))
            .collect())
    }
}

/// Learned vocabulary and inverse document frequencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerState {
    /// Term → column index, columns in sorted term order
    vocabulary: HashMap<String, usize>,

    /// IDF per column
    idf: Vec<f64>,

    /// Number of documents seen during fit
    n_documents: usize,
}

impl VectorizerState {
    pub fn vocab_size(&self) -> usize {
        self.idf.len()
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Column index of `term`, if in the vocabulary
    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, column: usize) -> Option<f64> {
        self.idf.get(column).copied()
    }

    /// Vocabulary terms in column order
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<(&str, usize)> = self
            .vocabulary
            .iter()
            .map(|(term, idx)| (term.as_str(), *idx))
            .collect();
        terms.sort_by_key(|(_, idx)| *idx);
        terms.into_iter().map(|(term, _)| term).collect()
    }
}

/// Count vectorization followed by smoothed TF-IDF weighting and L2 row
/// normalization.
#[derive(Debug, Clone)]
pub struct TextVectorizer {
    tokenizer: Tokenizer,
    lowercase: bool,
}

impl TextVectorizer {
    pub fn new(tokenizer: Tokenizer, lowercase: bool) -> Self {
        Self {
            tokenizer,
            lowercase,
        }
    }

    fn analyze(&self, message: &str) -> Vec<String> {
        if self.lowercase {
            self.tokenizer.tokenize(&message.to_lowercase())
        } else {
            self.tokenizer.tokenize(message)
        }
    }
}

impl Transformer for TextVectorizer {
    type State = VectorizerState;
    type Output = SparseMatrix;

    fn fit(&self, messages: &[String]) -> Result<VectorizerState> {
        let documents: Vec<HashSet<String>> = messages
            .par_iter()
            .map(|message| self.analyze(message).into_iter().collect())
            .collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for terms in documents {
            for term in terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(AppError::EmptyVocabulary);
        }

        let n_documents = messages.len();
        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());

        // BTreeMap iteration is sorted, so columns follow term order
        for (column, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n_documents as f64) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, column);
        }

        Ok(VectorizerState {
            vocabulary,
            idf,
            n_documents,
        })
    }

    fn transform(&self, messages: &[String], state: &VectorizerState) -> Result<SparseMatrix> {
        let rows: Vec<Vec<(usize, f64)>> = messages
            .par_iter()
            .map(|message| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for token in self.analyze(message) {
                    if let Some(column) = state.column(&token) {
                        *counts.entry(column).or_insert(0.0) += 1.0;
                    }
                }

                let mut row: Vec<(usize, f64)> = counts
                    .into_iter()
                    .map(|(column, count)| (column, count * state.idf[column]))
                    .collect();

                let norm = row.iter().map(|(_, value)| value * value).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, value) in row.iter_mut() {
                        *value /= norm;
                    }
                }
                row
            })
            .collect();

        SparseMatrix::from_rows(rows, state.vocab_size())
    }
}

/// State of the composed feature pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedState {
    pub text: VectorizerState,
}

impl ComposedState {
    /// Width of the composed feature matrix
    pub fn n_features(&self) -> usize {
        self.text.vocab_size() + 1
    }
}

/// `[tfidf | starting_verb]` feature union
#[derive(Debug, Clone)]
pub struct FeatureComposer {
    text: TextVectorizer,
    starting_verb: StartingVerbFeature,
}

impl FeatureComposer {
    pub fn new(resources: Arc<LanguageResources>, settings: &FeatureSettings) -> Result<Self> {
        let tokenizer = Tokenizer::new(resources.clone(), settings.url_placeholder.clone())?;
        Ok(Self {
            text: TextVectorizer::new(tokenizer.clone(), settings.lowercase),
            starting_verb: StartingVerbFeature::new(resources, tokenizer),
        })
    }
}

impl Transformer for FeatureComposer {
    type State = ComposedState;
    type Output = SparseMatrix;

    fn fit(&self, messages: &[String]) -> Result<ComposedState> {
        let text = self.text.fit(messages)?;
        self.starting_verb.fit(messages)?;
        Ok(ComposedState { text })
    }

    fn transform(&self, messages: &[String], state: &ComposedState) -> Result<SparseMatrix> {
        let tfidf = self.text.transform(messages, &state.text)?;
        let verbs: Vec<f64> = self
            .starting_verb
            .transform(messages, &())?
            .into_iter()
            .map(|starts| if starts { 1.0 } else { 0.0 })
            .collect();

        tfidf.hstack(&SparseMatrix::from_column(&verbs))
    }
}
