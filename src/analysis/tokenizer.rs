use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Longest term kept, in characters. Longer words are truncated.
pub const MAX_TERM_LENGTH: usize = 25;

/// Splits text into normalized index terms.
///
/// Words follow Unicode word boundaries with `_` acting as a separator.
/// Each word is case folded and stripped of accents (NFKD, drop combining
/// marks, NFKC), then truncated to `max_term_length` characters.
#[derive(Debug, Clone)]
pub struct TermTokenizer {
    pub max_term_length: usize,
}

impl Default for TermTokenizer {
    fn default() -> Self {
        TermTokenizer {
            max_term_length: MAX_TERM_LENGTH,
        }
    }
}

impl TermTokenizer {
    pub fn new(max_term_length: usize) -> Self {
        TermTokenizer { max_term_length }
    }

    /// Terms of `text` in their original order.
    pub fn term_list(&self, text: &str) -> Vec<Vec<u8>> {
        let text = text.replace('_', " ");

        text.unicode_words()
            .map(|word| self.normalize(word))
            .filter(|term| !term.is_empty())
            .map(String::into_bytes)
            .collect()
    }

    /// Normalizes a single word.
    pub fn normalize(&self, word: &str) -> String {
        // Lowercase after decomposition; some compatibility forms only
        // have a lowercase mapping once decomposed
        let folded: String = word
            .nfkd()
            .collect::<String>()
            .to_lowercase()
            .chars()
            .filter(|&c| !is_combining_mark(c))
            .collect();

        folded.nfkc().take(self.max_term_length).collect()
    }
}
