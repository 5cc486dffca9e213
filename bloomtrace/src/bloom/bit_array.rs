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

/// A fixed-length sequence of bits, all initially unset.
///
/// Bits are packed into `u64` words; the number of set bits is tracked incrementally so that
/// [`count_set()`](Self::count_set) is O(1). Bits can only ever be set, never cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitArray {
    /// Number of addressable bits
    len: u64,
    /// Count of bits set to 1
    num_bits_set: u64,
    /// Length = ceil(len / 64)
    words: Box<[u64]>,
}

impl BitArray {
    /// Creates a bit array of `len` bits, all unset.
    pub fn new(len: u64) -> Self {
        let num_words = len.div_ceil(64) as usize;
        BitArray {
            len,
            num_bits_set: 0,
            words: vec![0u64; num_words].into_boxed_slice(),
        }
    }

    /// Rebuilds a bit array from raw words, recounting the set bits.
    ///
    /// Bits at positions `>= len` in the last word must be zero.
    pub(crate) fn from_words(len: u64, words: Box<[u64]>) -> Self {
        debug_assert_eq!(words.len(), len.div_ceil(64) as usize);
        let num_bits_set = words.iter().map(|w| u64::from(w.count_ones())).sum();
        BitArray {
            len,
            num_bits_set,
            words,
        }
    }

    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }

    /// Returns the number of bits.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns the number of bits set to 1.
    pub fn count_set(&self) -> u64 {
        self.num_bits_set
    }

    /// Returns the value of the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn get(&self, index: u64) -> bool {
        let (word_index, mask) = self.locate(index);
        (self.words[word_index] & mask) != 0
    }

    /// Sets the bit at `index` to 1.
    ///
    /// Returns `true` if the bit was previously unset. Setting a bit that is already set
    /// leaves the array unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn set(&mut self, index: u64) -> bool {
        let (word_index, mask) = self.locate(index);
        let word = &mut self.words[word_index];
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.num_bits_set += 1;
        true
    }

    /// Returns an iterator over all bits in index order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(16, 2).unwrap();
    /// filter.add("apple");
    ///
    /// let rendered: String = filter
    ///     .bits()
    ///     .iter()
    ///     .map(|bit| if bit { '1' } else { '0' })
    ///     .collect();
    /// assert_eq!(rendered.len(), 16);
    /// ```
    pub fn iter(&self) -> impl ExactSizeIterator<Item = bool> + '_ {
        (0..self.len as usize).map(move |i| {
            let word = self.words[i >> 6];
            (word >> (i & 63)) & 1 == 1
        })
    }

    /// Sets every bit that is set in `other`; both arrays must have the same length.
    pub(crate) fn union_with(&mut self, other: &BitArray) {
        debug_assert_eq!(self.len, other.len);
        let mut num_bits_set = 0;
        for (word, other_word) in self.words.iter_mut().zip(other.words.iter()) {
            *word |= *other_word;
            num_bits_set += u64::from(word.count_ones());
        }
        self.num_bits_set = num_bits_set;
    }

    fn locate(&self, index: u64) -> (usize, u64) {
        assert!(
            index < self.len,
            "bit index {index} out of range for bit array of length {}",
            self.len
        );
        let word_index = (index >> 6) as usize; // index / 64
        let mask = 1u64 << (index & 63); // index % 64
        (word_index, mask)
    }
}
