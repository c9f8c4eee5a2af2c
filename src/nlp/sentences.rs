use crate::nlp::resources::LanguageResources;
use std::sync::Arc;

/// Punctuation-driven sentence splitter with an abbreviation list
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    resources: Arc<LanguageResources>,
}

impl SentenceSplitter {
    pub fn new(resources: Arc<LanguageResources>) -> Self {
        Self { resources }
    }

    /// Split `text` into trimmed, non-empty sentences.
    ///
    /// A boundary is a run of `.`, `!` or `?` (plus closing quotes or
    /// brackets) followed by whitespace or end of text. A period after a known
    /// abbreviation or a single-letter initial is not a boundary.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            let (position, c) = chars[i];
            if !is_terminal(c) {
                i += 1;
                continue;
            }

            let mut j = i + 1;
            while j < chars.len() && (is_terminal(chars[j].1) || is_closing(chars[j].1)) {
                j += 1;
            }

            let at_boundary = j == chars.len() || chars[j].1.is_whitespace();
            let abbreviated = c == '.' && j == i + 1 && self.ends_with_abbreviation(&text[start..position]);

            if at_boundary && !abbreviated {
                let end = chars.get(j).map_or(text.len(), |(offset, _)| *offset);
                push_trimmed(&mut sentences, &text[start..end]);
                start = end;
            }
            i = j;
        }

        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }

    fn ends_with_abbreviation(&self, prefix: &str) -> bool {
        let word = prefix
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or("")
            .trim_start_matches(|c: char| !c.is_alphanumeric());
        if word.is_empty() {
            return false;
        }

        let mut letters = word.chars();
        let single_initial = matches!(
            (letters.next(), letters.next()),
            (Some(first), None) if first.is_uppercase()
        );

        single_initial
            || self
                .resources
                .sentences
                .abbreviations
                .contains(&word.to_lowercase())
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '}')
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}
