// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The seeded hash family shared by every filter in this crate.
//!
//! Hash function `i` of a filter with `k` hash functions is MurmurHash3 x86_32 keyed with
//! seed `i`, for `i` in `0..k`. The 32-bit result is reinterpreted as a signed integer, and
//! the bit index is its Euclidean remainder modulo the filter size, so negative hashes still
//! land inside `[0, size)`.

mod murmurhash;

pub(crate) use self::murmurhash::MurmurHash3X86_32;

/// Hashes `item` with the hash function selected by `seed`.
pub(crate) fn hash32(item: &[u8], seed: u32) -> i32 {
    use std::hash::Hasher;

    let mut hasher = MurmurHash3X86_32::with_seed(seed);
    hasher.write(item);
    hasher.finish32() as i32
}

/// Maps a signed hash onto a bit index in `[0, size)`.
///
/// # Panics
///
/// Panics if `size` is zero.
pub(crate) fn bit_index(hash: i32, size: u64) -> u64 {
    assert!(size > 0, "size must be positive");
    i128::from(hash).rem_euclid(i128::from(size)) as u64
}

/// Computes `(hash, index)` for one hash function of the family.
#[inline]
pub(crate) fn probe(item: &[u8], seed: u32, size: u64) -> (i32, u64) {
    let hash = hash32(item, seed);
    (hash, bit_index(hash, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash32_matches_reference_values() {
        assert_eq!(hash32(b"foo", 0), -156908512);
        assert_eq!(hash32(b"foo", 42), -1322301282);
        assert_eq!(hash32(b"apple", 0), 1880549520);
        assert_eq!(hash32(b"apple", 1), -2082288777);
    }

    #[test]
    fn test_seeds_give_different_hashes() {
        let hashes: Vec<i32> = (0..8).map(|seed| hash32(b"banana", seed)).collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_bit_index_of_negative_hash() {
        assert_eq!(bit_index(-156908512, 100), 88);
        assert_eq!(bit_index(-1, 100), 99);
        assert_eq!(bit_index(-100, 100), 0);
        assert_eq!(bit_index(i32::MIN, 7), 5);
    }

    #[test]
    fn test_bit_index_of_positive_hash() {
        assert_eq!(bit_index(1880549520, 100), 20);
        assert_eq!(bit_index(i32::MAX, 1), 0);
        assert_eq!(bit_index(5, u64::MAX), 5);
    }

    #[test]
    fn test_probe() {
        assert_eq!(probe(b"apple", 1, 100), (-2082288777, 23));
        assert_eq!(probe(b"banana", 0, 100), (-178115665, 35));
    }

    #[test]
    #[should_panic(expected = "size must be positive")]
    fn test_bit_index_zero_size() {
        bit_index(1, 0);
    }
}
