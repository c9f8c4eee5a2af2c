use crate::nlp::resources::LanguageResources;
use std::sync::Arc;

/// Rule-based noun lemmatizer.
///
/// Case-sensitive: lookups and suffix rules operate on the token as given, so
/// all-caps plurals such as `FLOODS` pass through unchanged.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    resources: Arc<LanguageResources>,
}

impl Lemmatizer {
    pub fn new(resources: Arc<LanguageResources>) -> Self {
        Self { resources }
    }

    /// Reduce a noun to its lemma
    pub fn lemmatize(&self, token: &str) -> String {
        let tables = &self.resources.lemmatizer;

        if let Some(lemma) = tables.exceptions.get(token) {
            return lemma.clone();
        }
        if tables.invariant.contains(token) {
            return token.to_string();
        }

        for rule in &tables.rules {
            if let Some(stem) = token.strip_suffix(rule.suffix.as_str()) {
                // "ss" endings are singular ("glass", "address")
                if rule.suffix == "s" && stem.ends_with('s') {
                    continue;
                }
                if stem.chars().count() + rule.replacement.chars().count()
                    < tables.min_stem_length
                {
                    continue;
                }
                if !stem.chars().all(char::is_alphabetic) {
                    continue;
                }
                return format!("{}{}", stem, rule.replacement);
            }
        }

        token.to_string()
    }
}
