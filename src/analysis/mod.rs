pub mod tokenizer;
pub mod term_generator;

pub use term_generator::TermGenerator;
pub use tokenizer::{TermTokenizer, MAX_TERM_LENGTH};
