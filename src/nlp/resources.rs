use crate::error::{AppError, Result};
use crate::nlp::tagger::PosTag;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

/// English resources compiled into the binary
const BUNDLED_ENGLISH: &str = include_str!("../../resources/english.toml");

/// Noun detachment rule: strip `suffix`, append `replacement`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DetachmentRule {
    pub suffix: String,
    pub replacement: String,
}

/// Lemmatizer tables
#[derive(Debug, Clone)]
pub struct LemmaResources {
    pub min_stem_length: usize,
    pub rules: Vec<DetachmentRule>,
    pub exceptions: HashMap<String, String>,
    pub invariant: HashSet<String>,
}

/// Word → tag lexicon used before suffix heuristics
#[derive(Debug, Clone)]
pub struct TaggerResources {
    pub lexicon: HashMap<String, PosTag>,
}

/// Sentence-boundary resources
#[derive(Debug, Clone)]
pub struct SentenceResources {
    pub abbreviations: HashSet<String>,
}

/// All linguistic resources the tokenizer, tagger and sentence splitter need.
///
/// Loaded once per process through [`crate::nlp::init`]; components share it
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct LanguageResources {
    /// SHA-256 of the source document, hex encoded
    pub fingerprint: String,
    pub lemmatizer: LemmaResources,
    pub tagger: TaggerResources,
    pub sentences: SentenceResources,
}

#[derive(Deserialize)]
struct RawResources {
    lemmatizer: RawLemmatizer,
    tagger: RawTagger,
    sentences: RawSentences,
}

#[derive(Deserialize)]
struct RawLemmatizer {
    min_stem_length: usize,
    rules: Vec<DetachmentRule>,
    #[serde(default)]
    exceptions: HashMap<String, String>,
    #[serde(default)]
    invariant: Vec<String>,
}

#[derive(Deserialize)]
struct RawTagger {
    lexicon: HashMap<String, String>,
}

#[derive(Deserialize)]
struct RawSentences {
    #[serde(default)]
    abbreviations: Vec<String>,
}

impl LanguageResources {
    /// Load resources from `path`, or the bundled English set when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    AppError::ResourcesUnavailable(format!("{}: {}", path.display(), e))
                })?;
                Self::from_toml(&contents)
            }
            None => Self::bundled(),
        }
    }

    /// The bundled English resources
    pub fn bundled() -> Result<Self> {
        Self::from_toml(BUNDLED_ENGLISH)
    }

    /// Parse and validate a resource document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw: RawResources = toml::from_str(contents)?;

        if raw.lemmatizer.rules.is_empty() {
            return Err(AppError::ResourcesUnavailable(
                "lemmatizer defines no detachment rules".to_string(),
            ));
        }
        if raw.lemmatizer.rules.iter().any(|rule| rule.suffix.is_empty()) {
            return Err(AppError::ResourcesUnavailable(
                "lemmatizer rule with empty suffix".to_string(),
            ));
        }
        if raw.tagger.lexicon.is_empty() {
            return Err(AppError::ResourcesUnavailable(
                "tagger lexicon is empty".to_string(),
            ));
        }

        let lexicon = raw
            .tagger
            .lexicon
            .into_iter()
            .map(|(word, tag)| {
                PosTag::from_str(&tag)
                    .map(|tag| (word.clone(), tag))
                    .map_err(|_| {
                        AppError::ResourcesUnavailable(format!(
                            "unknown tag '{}' for lexicon word '{}'",
                            tag, word
                        ))
                    })
            })
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self {
            fingerprint: fingerprint(contents),
            lemmatizer: LemmaResources {
                min_stem_length: raw.lemmatizer.min_stem_length,
                rules: raw.lemmatizer.rules,
                exceptions: raw.lemmatizer.exceptions,
                invariant: raw.lemmatizer.invariant.into_iter().collect(),
            },
            tagger: TaggerResources { lexicon },
            sentences: SentenceResources {
                abbreviations: raw
                    .sentences
                    .abbreviations
                    .into_iter()
                    .map(|abbreviation| abbreviation.to_lowercase())
                    .collect(),
            },
        })
    }
}

fn fingerprint(contents: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    format!("{:x}", hasher.finalize())
}
