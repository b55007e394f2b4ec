// ============================================================
// Layer 4 - Line Normalizer
// ============================================================
// The text side of the encoding pipeline, expressed as
// HuggingFace `tokenizers` components so that counting and
// encoding split lines identically:
//
//   normalizer     BertNormalizer (clean_text only)
//                  + Lowercase, when configured
//   pre_tokenizer  WhitespaceSplit
//
// BertNormalizer's clean_text drops control and format
// characters (e.g. U+0001, U+200B, U+FEFF) and maps every
// whitespace character (tabs, U+00A0, ...) to a plain space.
// Chinese-character spacing and accent stripping stay off.
//
// A line never gains or loses its position in the file here:
// an empty line still yields an empty symbol list, so text
// rows stay aligned with the label file.

use tokenizers::{
    normalizers::{BertNormalizer, Lowercase, NormalizerWrapper, Sequence},
    pre_tokenizers::{whitespace::WhitespaceSplit, PreTokenizerWrapper},
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer,
};

use crate::domain::error::{CorpusError, Result};

#[derive(Clone, Debug)]
pub struct LineNormalizer {
    normalizer: NormalizerWrapper,
    pre_tokenizer: PreTokenizerWrapper,
}

impl LineNormalizer {
    pub fn new(lower_case: bool) -> Self {
        let clean: NormalizerWrapper = BertNormalizer::new(true, false, Some(false), false).into();
        let normalizer = if lower_case {
            Sequence::new(vec![clean, Lowercase.into()]).into()
        } else {
            clean
        };

        Self {
            normalizer,
            pre_tokenizer: WhitespaceSplit.into(),
        }
    }

    /// Normalizer to install on a Tokenizer.
    pub fn normalizer(&self) -> NormalizerWrapper {
        self.normalizer.clone()
    }

    /// Pre-tokenizer to install on a Tokenizer.
    pub fn pre_tokenizer(&self) -> PreTokenizerWrapper {
        self.pre_tokenizer.clone()
    }

    /// Normalize the line and split it into symbols.
    pub fn symbols(&self, line: &str) -> Result<Vec<String>> {
        let mut normalized = NormalizedString::from(line);
        self.normalizer
            .normalize(&mut normalized)
            .map_err(|e| CorpusError::tokenizer("cannot normalize line", e))?;

        let mut pretokenized = PreTokenizedString::from(normalized);
        self.pre_tokenizer
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| CorpusError::tokenizer("cannot split line", e))?;

        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Char)
            .into_iter()
            .map(|(sym, _, _)| sym.to_string())
            .collect())
    }
}

impl Default for LineNormalizer {
    fn default() -> Self {
        Self::new(false)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_runs() {
        let n = LineNormalizer::default();
        assert_eq!(n.symbols("hello \t  world").unwrap(), vec!["hello", "world"]);
        assert_eq!(n.symbols("a\u{00A0}b").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_drops_control_chars() {
        let n = LineNormalizer::default();
        assert_eq!(n.symbols("hello\x01world").unwrap(), vec!["helloworld"]);
        assert_eq!(n.symbols("b\u{200B}c").unwrap(), vec!["bc"]);
    }

    #[test]
    fn test_lower_case_is_optional() {
        assert_eq!(
            LineNormalizer::new(true).symbols("Hello WORLD").unwrap(),
            vec!["hello", "world"]
        );
        assert_eq!(LineNormalizer::new(false).symbols("Hello").unwrap(), vec!["Hello"]);
    }

    #[test]
    fn test_punctuation_stays_attached() {
        let n = LineNormalizer::default();
        assert_eq!(n.symbols("great, really!").unwrap(), vec!["great,", "really!"]);
    }

    #[test]
    fn test_empty_line() {
        let n = LineNormalizer::default();
        assert!(n.symbols("").unwrap().is_empty());
        assert!(n.symbols("   \r").unwrap().is_empty());
    }
}
