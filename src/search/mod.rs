pub mod posting_iterator;
pub mod and_iterator;
pub mod or_iterator;
pub mod position_iterator;
pub mod phrase_iterator;

pub use and_iterator::AndPostingIterator;
pub use or_iterator::OrPostingIterator;
pub use phrase_iterator::PhraseAndIterator;
pub use position_iterator::VectorPositionInfoIterator;
pub use posting_iterator::{collect_ids, PostingIterator, VectorPostingIterator};
