use crate::analysis::tokenizer::TermTokenizer;
use crate::core::types::Document;

/// Which term set of a document a call feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Content,
    FileName,
    Xattr,
}

/// Turns text into positioned terms on a `Document`.
///
/// Positions start at 1 and keep counting across calls, with a gap of one
/// after every call so that words from unrelated fields never look
/// adjacent to a phrase query. Text that yields a single term is stored
/// without a position.
pub struct TermGenerator<'a> {
    doc: &'a mut Document,
    tokenizer: TermTokenizer,
    position: u32,
}

impl<'a> TermGenerator<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        TermGenerator {
            doc,
            tokenizer: TermTokenizer::default(),
            position: 1,
        }
    }

    pub fn with_tokenizer(doc: &'a mut Document, tokenizer: TermTokenizer) -> Self {
        TermGenerator {
            doc,
            tokenizer,
            position: 1,
        }
    }

    pub fn term_list(&self, text: &str) -> Vec<Vec<u8>> {
        self.tokenizer.term_list(text)
    }

    pub fn index_text(&mut self, text: &str) {
        self.index(Field::Content, text, b"");
    }

    pub fn index_text_with_prefix(&mut self, text: &str, prefix: &[u8]) {
        self.index(Field::Content, text, prefix);
    }

    pub fn index_file_name_text(&mut self, text: &str) {
        self.index(Field::FileName, text, b"");
    }

    pub fn index_file_name_text_with_prefix(&mut self, text: &str, prefix: &[u8]) {
        self.index(Field::FileName, text, prefix);
    }

    pub fn index_xattr_text(&mut self, text: &str, prefix: &[u8]) {
        self.index(Field::Xattr, text, prefix);
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    fn index(&mut self, field: Field, text: &str, prefix: &[u8]) {
        let terms = self.tokenizer.term_list(text);

        if let [term] = terms.as_slice() {
            let full = [prefix, term.as_slice()].concat();
            match field {
                Field::Content => self.doc.add_term(full),
                Field::FileName => self.doc.add_file_name_term(full),
                Field::Xattr => self.doc.add_xattr_term(full),
            }
            return;
        }

        for term in &terms {
            let full = [prefix, term.as_slice()].concat();
            match field {
                Field::Content => self.doc.add_position_term(full, self.position),
                Field::FileName => self.doc.add_file_name_position_term(full, self.position),
                Field::Xattr => self.doc.add_xattr_position_term(full, self.position),
            }
            self.position += 1;
        }
        self.position += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_follow_token_order() {
        let mut doc = Document::new(1);
        let mut tg = TermGenerator::new(&mut doc);
        tg.index_text("The quick fox the");
        assert_eq!(tg.position(), 6);

        assert_eq!(doc.terms.get(b"the".as_slice()), Some(&vec![1, 4]));
        assert_eq!(doc.terms.get(b"quick".as_slice()), Some(&vec![2]));
        assert_eq!(doc.terms.get(b"fox".as_slice()), Some(&vec![3]));
    }

    #[test]
    fn single_term_is_unpositioned() {
        let mut doc = Document::new(1);
        let mut tg = TermGenerator::new(&mut doc);
        tg.index_text_with_prefix("image/png", b"M");
        tg.index_text_with_prefix("Audio", b"T");
        assert_eq!(tg.position(), 1 + 3);

        assert_eq!(doc.terms.get(b"Taudio".as_slice()), Some(&Vec::new()));
        assert_eq!(doc.terms.get(b"Mimage".as_slice()), Some(&vec![1]));
        assert_eq!(doc.terms.get(b"Mpng".as_slice()), Some(&vec![2]));
    }

    #[test]
    fn calls_are_separated_by_a_gap() {
        let mut doc = Document::new(1);
        let mut tg = TermGenerator::new(&mut doc);
        tg.index_text("hello world");
        tg.index_file_name_text("my_file.txt");
        tg.index_xattr_text("red green", b"TA");

        assert_eq!(doc.terms.get(b"world".as_slice()), Some(&vec![2]));
        assert_eq!(doc.file_name_terms.get(b"my".as_slice()), Some(&vec![4]));
        assert_eq!(doc.file_name_terms.get(b"file.txt".as_slice()), Some(&vec![5]));
        assert_eq!(doc.xattr_terms.get(b"TAred".as_slice()), Some(&vec![7]));
    }

    #[test]
    fn set_position_moves_counter() {
        let mut doc = Document::new(1);
        let mut tg = TermGenerator::new(&mut doc);
        tg.set_position(100);
        tg.index_text("a b");
        assert_eq!(doc.terms.get(b"a".as_slice()), Some(&vec![100]));
    }
}
