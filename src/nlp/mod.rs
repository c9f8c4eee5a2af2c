/// Natural-language processing for disaster messages
///
/// This module provides:
/// - URL normalization and Treebank-style word tokenization
/// - Rule-based noun lemmatization
/// - Sentence splitting
/// - Lexicon-based part-of-speech tagging
///
/// Linguistic resources are loaded once per process by [`init`] and shared
/// by every component.

pub mod lemmatizer;
pub mod resources;
pub mod sentences;
pub mod tagger;
pub mod tokenizer;

pub use lemmatizer::Lemmatizer;
pub use resources::LanguageResources;
pub use sentences::SentenceSplitter;
pub use tagger::{PosTag, PosTagger};
pub use tokenizer::Tokenizer;

use crate::config::NlpConfig;
use crate::error::Result;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

static RESOURCES: OnceCell<Arc<LanguageResources>> = OnceCell::new();

/// Load the language resources named by `config`, once.
///
/// Later calls return the already-loaded resources regardless of `config`.
/// Fails with `ResourcesUnavailable` when the resource file is missing or
/// malformed; nothing is cached on failure.
pub fn init(config: &NlpConfig) -> Result<Arc<LanguageResources>> {
    RESOURCES
        .get_or_try_init(|| {
            let resources = LanguageResources::load(config.resources_path.as_deref())?;
            info!(
                source = %config
                    .resources_path
                    .as_ref()
                    .map_or_else(|| "bundled".to_string(), |path| path.display().to_string()),
                lexicon_size = resources.tagger.lexicon.len(),
                "Language resources loaded"
            );
            Ok(Arc::new(resources))
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = NlpConfig::default();
        let first = init(&config).unwrap();
        let second = init(&config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
