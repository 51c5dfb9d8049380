use serde::{Deserialize, Serialize};
use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;

/// Positions of one term inside one document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionInfo {
    pub doc_id: DocId,
    pub positions: Vec<u32>,
}

impl PositionInfo {
    pub fn new(doc_id: DocId, positions: Vec<u32>) -> Self {
        PositionInfo { doc_id, positions }
    }
}

/// Encodes a term's position entries, sorted by document id.
///
/// Layout (all vbyte): `entry_count`, then per entry `doc_gap, position_count,
/// position_gaps...`. Document gaps are relative to the previous entry and
/// position gaps to the previous position in the same entry.
pub struct PositionCodec;

impl PositionCodec {
    pub fn encode(list: &[PositionInfo]) -> Vec<u8> {
        let mut output = Vec::new();
        VByteEncoder::encode_u64(&mut output, list.len() as u64);

        let mut prev_doc = 0u64;
        for info in list {
            VByteEncoder::encode_u64(&mut output, info.doc_id.wrapping_sub(prev_doc));
            prev_doc = info.doc_id;

            VByteEncoder::encode_u64(&mut output, info.positions.len() as u64);
            let mut prev_pos = 0u32;
            for &pos in &info.positions {
                VByteEncoder::encode_u64(&mut output, pos.wrapping_sub(prev_pos) as u64);
                prev_pos = pos;
            }
        }

        output
    }

    pub fn decode(data: &[u8]) -> Result<Vec<PositionInfo>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = VByteReader::new(data);
        let count = reader.read_u64()? as usize;
        // Every entry needs at least two bytes
        let mut list = Vec::with_capacity(count.min(data.len() / 2));

        let mut prev_doc = 0u64;
        for _ in 0..count {
            let doc_id = prev_doc.checked_add(reader.read_u64()?)
                .ok_or_else(|| Error::new(ErrorKind::Parse, "Position entry id overflow".to_string()))?;
            prev_doc = doc_id;

            let pos_count = reader.read_u64()? as usize;
            let mut positions = Vec::with_capacity(pos_count.min(data.len()));
            let mut prev_pos = 0u32;
            for _ in 0..pos_count {
                let gap = u32::try_from(reader.read_u64()?)
                    .map_err(|_| Error::new(ErrorKind::Parse, "Position gap overflow".to_string()))?;
                prev_pos = prev_pos.checked_add(gap)
                    .ok_or_else(|| Error::new(ErrorKind::Parse, "Position overflow".to_string()))?;
                positions.push(prev_pos);
            }

            list.push(PositionInfo { doc_id, positions });
        }

        if !reader.is_empty() {
            return Err(Error::new(ErrorKind::Parse, "Trailing bytes after position list".to_string()));
        }

        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_entries() {
        let list = vec![
            PositionInfo::new(1, vec![1, 5, 6]),
            PositionInfo::new(70, vec![2]),
            PositionInfo::new(u64::MAX, vec![3, 4_000_000]),
        ];
        let data = PositionCodec::encode(&list);
        assert_eq!(PositionCodec::decode(&data).unwrap(), list);
    }

    #[test]
    fn empty_blob_decodes_to_nothing() {
        assert!(PositionCodec::decode(&[]).unwrap().is_empty());
        assert!(PositionCodec::decode(&PositionCodec::encode(&[])).unwrap().is_empty());
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let list = vec![PositionInfo::new(9, vec![1, 2, 3])];
        let data = PositionCodec::encode(&list);
        assert!(PositionCodec::decode(&data[..data.len() - 1]).is_err());
    }
}
