use crate::error::{AppError, Result};
use crate::nlp::lemmatizer::Lemmatizer;
use crate::nlp::resources::LanguageResources;
use crate::nlp::sentences::SentenceSplitter;
use regex::Regex;
use std::sync::Arc;

/// URL pattern matched before word splitting
pub const URL_PATTERN: &str =
    r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+";

/// Treebank substitutions applied to the bare sentence: (pattern, replacement)
const TREEBANK_RULES: &[(&str, &str)] = &[
    // starting quotes
    (r#"^""#, " `` "),
    (r"(``)", " $1 "),
    (r#"([ (\[{<])(")"#, "$1 `` "),
    // punctuation
    (r"([:,])([^\d])", " $1 $2"),
    (r"([:,])$", " $1 "),
    (r"\.\.\.", " ... "),
    (r"[;@#$%&]", " $0 "),
    (r#"([^.])(\.)([\]\)}>"']*)\s*$"#, "$1 $2$3 "),
    (r"[?!]", " $0 "),
    (r"([^'])' ", "$1 ' "),
    // brackets
    (r"[\]\[\(\)\{\}<>]", " $0 "),
    (r"--", " -- "),
];

/// Substitutions applied after space padding: ending quotes and clitics
const CLITIC_RULES: &[(&str, &str)] = &[
    (r#"""#, " '' "),
    (r"(\S)('')", "$1 $2 "),
    (r"([^' ])('[sS]|'[mM]|'[dD]|') ", "$1 $2 "),
    (r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "$1 $2 "),
];

/// Message tokenizer: URL normalization, Treebank word splitting, noun
/// lemmatization, lowercasing.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    url_pattern: Regex,
    placeholder: String,
    treebank: Vec<(Regex, &'static str)>,
    clitics: Vec<(Regex, &'static str)>,
    sentences: SentenceSplitter,
    lemmatizer: Lemmatizer,
}

impl Tokenizer {
    /// Build a tokenizer over shared resources
    pub fn new(resources: Arc<LanguageResources>, placeholder: impl Into<String>) -> Result<Self> {
        let url_pattern = Regex::new(URL_PATTERN)
            .map_err(|e| AppError::Internal(format!("Invalid URL pattern: {}", e)))?;

        let treebank = compile_rules(TREEBANK_RULES)?;
        let clitics = compile_rules(CLITIC_RULES)?;

        Ok(Self {
            url_pattern,
            placeholder: placeholder.into(),
            treebank,
            clitics,
            sentences: SentenceSplitter::new(resources.clone()),
            lemmatizer: Lemmatizer::new(resources),
        })
    }

    /// Replace every URL in `text` with the placeholder
    pub fn replace_urls(&self, text: &str) -> String {
        self.url_pattern
            .replace_all(text, self.placeholder.as_str())
            .into_owned()
    }

    /// Raw word tokens: URLs replaced, sentence-split, Treebank-split. No
    /// lemmatization or case folding.
    pub fn words(&self, text: &str) -> Vec<String> {
        let text = self.replace_urls(text);
        self.sentences
            .split(&text)
            .into_iter()
            .flat_map(|sentence| self.split_words(sentence))
            .collect()
    }

    /// Normalized tokens: lemmatized, lowercased and trimmed, in order
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.words(text)
            .iter()
            .map(|word| self.lemmatizer.lemmatize(word).to_lowercase().trim().to_string())
            .collect()
    }

    fn split_words(&self, sentence: &str) -> Vec<String> {
        let text = apply_rules(&self.treebank, sentence.to_string());
        // clitic rules anchor on surrounding spaces
        let text = apply_rules(&self.clitics, format!(" {} ", text));
        text.split_whitespace().map(str::to_string).collect()
    }
}

fn compile_rules(rules: &[(&str, &'static str)]) -> Result<Vec<(Regex, &'static str)>> {
    rules
        .iter()
        .map(|(pattern, replacement)| {
            Regex::new(pattern)
                .map(|regex| (regex, *replacement))
                .map_err(|e| AppError::Internal(format!("Invalid tokenizer rule: {}", e)))
        })
        .collect()
}

fn apply_rules(rules: &[(Regex, &'static str)], text: String) -> String {
    rules.iter().fold(text, |text, (regex, replacement)| {
        regex.replace_all(&text, *replacement).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(Arc::new(LanguageResources::bundled().unwrap()), "urlplaceholder").unwrap()
    }

    #[test]
    fn test_url_replaced_with_placeholder() {
        let tokens = tokenizer().tokenize("Visit http://example.com/help now");
        assert_eq!(tokens, vec!["visit", "urlplaceholder", "now"]);
    }

    #[test]
    fn test_https_url_with_escapes() {
        let tokens = tokenizer().tokenize("see https://t.co/a%20b?x=1");
        assert_eq!(tokens, vec!["see", "urlplaceholder"]);
    }

    #[test]
    fn test_punctuation_and_clitics_split() {
        let words = tokenizer().words("We don't have food, water.");
        assert_eq!(
            words,
            vec!["We", "do", "n't", "have", "food", ",", "water", "."]
        );
    }

    #[test]
    fn test_possessive_split() {
        let words = tokenizer().words("The village's roads are gone");
        assert_eq!(words, vec!["The", "village", "'s", "roads", "are", "gone"]);
    }

    #[test]
    fn test_tokens_lemmatized_and_lowercased() {
        let tokens = tokenizer().tokenize("Families need Tents and blankets");
        assert_eq!(tokens, vec!["family", "need", "tent", "and", "blanket"]);
    }

    #[test]
    fn test_each_sentence_final_period_split() {
        let tokens = tokenizer().tokenize("Help us. We are hungry.");
        assert_eq!(tokens, vec!["help", "us", ".", "we", "are", "hungry", "."]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenizer().tokenize("").is_empty());
        assert!(tokenizer().tokenize("   ").is_empty());
    }

    #[test]
    fn test_no_empty_tokens() {
        let tokens = tokenizer().tokenize("  RT  @user: floods!!  (urgent) -- 3 dead ");
        assert!(tokens.iter().all(|token| !token.is_empty()));
        assert_eq!(tokens[0], "rt");
    }
}
