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

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use log::debug;

use super::BitArray;
use super::BloomFilter;
use super::builder::validate;
use crate::error::Error;
use crate::hash;

/// A Bloom filter that can be shared between threads.
///
/// Uses the same hash family and bit layout as [`BloomFilter`], but stores bits in atomic
/// words so that `add` takes `&self`:
/// - `add` sets each bit with an atomic `fetch_or`, so concurrent adds never lose updates
/// - `check` reads without locking; it may miss an add that is still in flight, but never
///   misses one that completed before it started
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use bloomtrace::bloom::ConcurrentBloomFilter;
/// let filter = Arc::new(ConcurrentBloomFilter::new(1000, 4).unwrap());
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let filter = Arc::clone(&filter);
///         std::thread::spawn(move || filter.add(format!("item-{t}")))
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert!(filter.check("item-3"));
/// ```
#[derive(Debug)]
pub struct ConcurrentBloomFilter {
    num_hashes: u16,
    num_bits: u64,
    words: Box<[AtomicU64]>,
}

impl ConcurrentBloomFilter {
    /// Creates an empty filter with `size` bits and `num_hashes` hash functions.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` or `num_hashes` is zero or above the supported maximum.
    pub fn new(size: u64, num_hashes: u16) -> Result<Self, Error> {
        validate(size, num_hashes)?;
        debug!("building concurrent bloom filter with size={size} num_hashes={num_hashes}");

        let num_words = size.div_ceil(64) as usize;
        let words = (0..num_words).map(|_| AtomicU64::new(0)).collect();
        Ok(ConcurrentBloomFilter {
            num_hashes,
            num_bits: size,
            words,
        })
    }

    /// Adds an item to the filter.
    pub fn add(&self, item: impl AsRef<[u8]>) {
        let item = item.as_ref();
        for seed in 0..u32::from(self.num_hashes) {
            let (_, index) = hash::probe(item, seed, self.num_bits);
            let (word_index, mask) = locate(index);
            self.words[word_index].fetch_or(mask, Ordering::Release);
        }
    }

    /// Tests whether an item is possibly in the set, stopping at the first unset bit.
    pub fn check(&self, item: impl AsRef<[u8]>) -> bool {
        let item = item.as_ref();
        for seed in 0..u32::from(self.num_hashes) {
            let (_, index) = hash::probe(item, seed, self.num_bits);
            let (word_index, mask) = locate(index);
            if self.words[word_index].load(Ordering::Acquire) & mask == 0 {
                return false;
            }
        }
        true
    }

    /// Returns the number of bits currently set.
    pub fn count_set(&self) -> u64 {
        self.words
            .iter()
            .map(|word| u64::from(word.load(Ordering::Acquire).count_ones()))
            .sum()
    }

    /// Returns the total number of bits (m).
    pub fn size(&self) -> u64 {
        self.num_bits
    }

    /// Returns the number of hash functions (k).
    pub fn num_hashes(&self) -> u16 {
        self.num_hashes
    }

    /// Copies the current bits into a single-threaded [`BloomFilter`].
    pub fn snapshot(&self) -> BloomFilter {
        let words = self
            .words
            .iter()
            .map(|word| word.load(Ordering::Acquire))
            .collect();
        BloomFilter {
            num_hashes: self.num_hashes,
            bits: BitArray::from_words(self.num_bits, words),
        }
    }
}

impl From<BloomFilter> for ConcurrentBloomFilter {
    fn from(filter: BloomFilter) -> Self {
        let words = filter
            .bits
            .words()
            .iter()
            .map(|&word| AtomicU64::new(word))
            .collect();
        ConcurrentBloomFilter {
            num_hashes: filter.num_hashes,
            num_bits: filter.size(),
            words,
        }
    }
}

fn locate(index: u64) -> (usize, u64) {
    ((index >> 6) as usize, 1u64 << (index & 63))
}
