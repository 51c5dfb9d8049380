use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::Result;

/// Front-coded term lists for the document term-set databases.
///
/// Terms are written sorted; each one stores the length of the prefix it
/// shares with its predecessor and the remaining suffix.
pub struct TermsCodec;

impl TermsCodec {
    pub fn encode(terms: &[Vec<u8>]) -> Vec<u8> {
        let mut sorted: Vec<&[u8]> = terms.iter().map(|t| t.as_slice()).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut output = Vec::new();
        let mut prev: &[u8] = &[];
        for term in sorted {
            let shared = prev.iter().zip(term).take_while(|(a, b)| a == b).count();
            let suffix = &term[shared..];
            VByteEncoder::encode_u64(&mut output, shared as u64);
            VByteEncoder::encode_u64(&mut output, suffix.len() as u64);
            output.extend_from_slice(suffix);
            prev = term;
        }
        output
    }

    pub fn decode(data: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut reader = VByteReader::new(data);
        let mut terms: Vec<Vec<u8>> = Vec::new();

        while !reader.is_empty() {
            let shared = reader.read_u64()? as usize;
            let suffix_len = reader.read_u64()? as usize;
            let suffix = reader.read_bytes(suffix_len)?;

            let prev = terms.last().map(|t| t.as_slice()).unwrap_or(&[]);
            let shared = shared.min(prev.len());
            let mut term = Vec::with_capacity(shared + suffix.len());
            term.extend_from_slice(&prev[..shared]);
            term.extend_from_slice(suffix);
            terms.push(term);
        }

        Ok(terms)
    }
}
