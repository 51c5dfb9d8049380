use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;

/// Delta + vbyte encoding for sorted, unique document id lists.
///
/// Layout: `first_id, gap_1, gap_2, ...`, each as vbyte. Gaps are always
/// positive, so an empty list encodes to an empty blob and full 64-bit ids
/// round-trip without loss.
pub struct PostingCodec;

impl PostingCodec {
    pub fn encode(ids: &[DocId]) -> Vec<u8> {
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]), "posting list must be strictly increasing");

        let mut output = Vec::with_capacity(ids.len() * 2);
        let mut prev = 0u64;
        for (i, &id) in ids.iter().enumerate() {
            let delta = if i == 0 { id } else { id.wrapping_sub(prev) };
            VByteEncoder::encode_u64(&mut output, delta);
            prev = id;
        }
        output
    }

    pub fn decode(data: &[u8]) -> Result<Vec<DocId>> {
        let mut reader = VByteReader::new(data);
        let mut ids = Vec::with_capacity(data.len());
        let mut prev = 0u64;

        while !reader.is_empty() {
            let delta = reader.read_u64()?;
            let id = if ids.is_empty() {
                delta
            } else {
                if delta == 0 {
                    return Err(Error::new(ErrorKind::Parse, "Duplicate id in posting list".to_string()));
                }
                prev.checked_add(delta)
                    .ok_or_else(|| Error::new(ErrorKind::Parse, "Posting list id overflow".to_string()))?
            };
            ids.push(id);
            prev = id;
        }

        Ok(ids)
    }
}

/// Insert `id` keeping `list` sorted and unique.
pub fn sorted_id_insert(list: &mut Vec<DocId>, id: DocId) {
    if let Err(pos) = list.binary_search(&id) {
        list.insert(pos, id);
    }
}

/// Remove `id` from a sorted list; returns whether it was present.
pub fn sorted_id_remove(list: &mut Vec<DocId>, id: DocId) -> bool {
    match list.binary_search(&id) {
        Ok(pos) => {
            list.remove(pos);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_small_list() {
        let ids = vec![1, 2, 9, 12];
        let data = PostingCodec::encode(&ids);
        assert!(!data.is_empty());
        assert_eq!(PostingCodec::decode(&data).unwrap(), ids);
    }

    #[test]
    fn empty_list_is_empty_blob() {
        assert!(PostingCodec::encode(&[]).is_empty());
        assert!(PostingCodec::decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn sparse_ids_stay_compact() {
        let ids = vec![5, 1 << 40, (1 << 40) + 3, u64::MAX];
        let data = PostingCodec::encode(&ids);
        assert!(data.len() < ids.len() * 8);
        assert_eq!(PostingCodec::decode(&data).unwrap(), ids);
    }

    #[test]
    fn zero_gap_is_corruption() {
        let data = vec![4, 0];
        assert!(PostingCodec::decode(&data).is_err());
    }

    #[test]
    fn sorted_insert_and_remove() {
        let mut list = vec![3, 8];
        sorted_id_insert(&mut list, 5);
        sorted_id_insert(&mut list, 5);
        assert_eq!(list, vec![3, 5, 8]);
        assert!(sorted_id_remove(&mut list, 3));
        assert!(!sorted_id_remove(&mut list, 4));
        assert_eq!(list, vec![5, 8]);
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(set in proptest::collection::btree_set(any::<u64>(), 0..200)) {
            let ids: Vec<u64> = set.into_iter().collect();
            let data = PostingCodec::encode(&ids);
            prop_assert_eq!(PostingCodec::decode(&data).unwrap(), ids);
        }
    }
}
