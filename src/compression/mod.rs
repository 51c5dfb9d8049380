pub mod vbyte;
pub mod posting_codec;
pub mod position_codec;
pub mod terms_codec;

pub use position_codec::{PositionCodec, PositionInfo};
pub use posting_codec::PostingCodec;
pub use terms_codec::TermsCodec;
