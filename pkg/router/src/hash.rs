use std::io::Cursor;

/// Reduced hash space every key is bucketed into before dividing by shard
/// count. Keeping this fixed (rather than sizing it to shard count) means
/// the routing decision for a key only moves buckets when `shardCount`
/// itself changes, not every time a key is looked up.
pub const HASH_MODULO: u64 = 16384;

/// MurmurHash3 x64-128 of the key, truncated to its low 64 bits. `Cursor`
/// over an in-memory byte slice never fails to read, so the only error path
/// the underlying function has is unreachable here.
pub fn hash_key(key: &str) -> u64 {
    let mut cursor = Cursor::new(key.as_bytes());
    let hash128 = murmur3::murmur3_x64_128(&mut cursor, 0).expect("hashing an in-memory buffer cannot fail");
    hash128 as u64
}

/// Maps a hash into `[0, shard_count)`. Buckets are contiguous ranges of the
/// reduced hash space; a key whose reduced hash falls past the last exact
/// bucket boundary (possible when `HASH_MODULO` doesn't divide evenly by
/// `shard_count`) lands in the final bucket rather than going unplaced.
pub fn shard_index_from_hash(hash: u64, shard_count: u32) -> u32 {
    assert!(shard_count > 0, "shard_count must be at least 1");
    let reduced = hash % HASH_MODULO;
    let bucket_size = HASH_MODULO / shard_count as u64;

    for i in 0..shard_count {
        if reduced < (i as u64 + 1) * bucket_size {
            return i;
        }
    }
    shard_count - 1
}

pub fn shard_index_from_key(key: &str, shard_count: u32) -> u32 {
    shard_index_from_hash(hash_key(key), shard_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_key_always_hashes_to_the_same_shard() {
        let a = shard_index_from_key("widget-42", 4);
        let b = shard_index_from_key("widget-42", 4);
        assert_eq!(a, b);
    }

    #[test]
    fn boundary_hashes_land_in_the_expected_bucket() {
        assert_eq!(shard_index_from_hash(0, 4), 0);
        assert_eq!(shard_index_from_hash(4095, 4), 0);
        assert_eq!(shard_index_from_hash(4096, 4), 1);
        assert_eq!(shard_index_from_hash(16383, 4), 3);
    }

    #[test]
    fn uneven_shard_counts_still_place_every_hash() {
        for shard_count in 1..=7u32 {
            for reduced in [0u64, 1, HASH_MODULO / 2, HASH_MODULO - 1] {
                let idx = shard_index_from_hash(reduced, shard_count);
                assert!(idx < shard_count);
            }
        }
    }

    proptest! {
        #[test]
        fn every_hash_maps_into_range(hash: u64, shard_count in 1u32..=32) {
            let idx = shard_index_from_hash(hash, shard_count);
            prop_assert!(idx < shard_count);
        }
    }
}
