use crate::nlp::resources::LanguageResources;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// Penn Treebank part-of-speech tags (the subset the tagger emits)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum PosTag {
    CC,
    CD,
    DT,
    EX,
    IN,
    JJ,
    JJR,
    JJS,
    MD,
    NN,
    NNS,
    NNP,
    POS,
    PRP,
    #[strum(serialize = "PRP$")]
    PRPS,
    RB,
    TO,
    UH,
    VB,
    VBD,
    VBG,
    VBN,
    VBP,
    VBZ,
    WDT,
    WP,
    WRB,
    SYM,
    #[strum(serialize = ".")]
    Terminal,
    #[strum(serialize = ",")]
    Comma,
    #[strum(serialize = ":")]
    Colon,
    #[strum(serialize = "(")]
    OpenParen,
    #[strum(serialize = ")")]
    CloseParen,
    #[strum(serialize = "#")]
    Hash,
    #[strum(serialize = "$")]
    Dollar,
    #[strum(serialize = "``")]
    OpenQuote,
    #[strum(serialize = "''")]
    CloseQuote,
}

impl PosTag {
    /// Base form or non-3rd-person present verb
    pub fn is_base_or_present_verb(self) -> bool {
        matches!(self, PosTag::VB | PosTag::VBP)
    }

    fn is_plural_subject(self) -> bool {
        matches!(self, PosTag::PRP | PosTag::NNS)
    }
}

/// Lexicon-plus-heuristics part-of-speech tagger
#[derive(Debug, Clone)]
pub struct PosTagger {
    resources: Arc<LanguageResources>,
}

impl PosTagger {
    pub fn new(resources: Arc<LanguageResources>) -> Self {
        Self { resources }
    }

    /// Tag a token sequence. Output has one tag per token.
    pub fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<PosTag> {
        let mut tags: Vec<PosTag> = Vec::with_capacity(tokens.len());

        for (position, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            let lexical = self
                .resources
                .tagger
                .lexicon
                .get(&token.to_lowercase())
                .copied()
                .unwrap_or_else(|| Self::guess(token, position));

            let previous = tags.last().copied();
            let tag = match (lexical, previous) {
                // "we need", "they send"
                (PosTag::VB, Some(prev)) if prev.is_plural_subject() => PosTag::VBP,
                // "to help", "can send" keep the base form
                (PosTag::VBP, Some(PosTag::TO)) | (PosTag::VBP, Some(PosTag::MD)) => PosTag::VB,
                (tag, _) => tag,
            };
            tags.push(tag);
        }

        tags
    }

    fn guess(token: &str, position: usize) -> PosTag {
        if token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
            && token.chars().any(|c| c.is_ascii_digit())
        {
            return PosTag::CD;
        }
        if !token.chars().any(char::is_alphanumeric) {
            return PosTag::SYM;
        }
        if position > 0 && token.chars().next().map_or(false, char::is_uppercase) {
            return PosTag::NNP;
        }

        let lower = token.to_lowercase();
        if lower.ends_with("ing") && lower.len() > 4 {
            PosTag::VBG
        } else if lower.ends_with("ed") && lower.len() > 3 {
            PosTag::VBD
        } else if lower.ends_with("ly") && lower.len() > 3 {
            PosTag::RB
        } else if ["ous", "ful", "able", "ible", "ive", "less", "ic", "al"]
            .iter()
            .any(|suffix| lower.ends_with(suffix) && lower.len() > suffix.len() + 2)
        {
            PosTag::JJ
        } else if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 3 {
            PosTag::NNS
        } else {
            PosTag::NN
        }
    }
}
