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

use log::debug;

use super::BitArray;
use super::BloomFilter;
use super::probability::optimal_hash_count;
use super::probability::suggest_num_bits;
use crate::error::Error;

/// Smallest supported filter size in bits.
pub const MIN_NUM_BITS: u64 = 1;
/// Largest supported filter size in bits (128 GiB of bit storage).
pub const MAX_NUM_BITS: u64 = 1 << 40;
/// Smallest supported number of hash functions.
pub const MIN_NUM_HASHES: u16 = 1;
/// Largest supported number of hash functions.
pub const MAX_NUM_HASHES: u16 = i16::MAX as u16;

/// Builder for creating [`BloomFilter`] instances.
///
/// Provides three construction modes:
/// - [`with_size()`](Self::with_size): explicit bit count and hash count
/// - [`with_expected_items()`](Self::with_expected_items): explicit bit count, hash count
///   chosen for an expected number of insertions
/// - [`with_accuracy()`](Self::with_accuracy): both chosen for a target false positive rate
///
/// Parameters are validated by [`build()`](Self::build).
#[derive(Debug, Clone)]
pub struct BloomFilterBuilder {
    sizing: Sizing,
}

#[derive(Debug, Clone, Copy)]
enum Sizing {
    Size { num_bits: u64, num_hashes: u16 },
    ExpectedItems { num_bits: u64, expected_items: u64 },
    Accuracy { max_items: u64, fpp: f64 },
}

impl BloomFilterBuilder {
    /// Creates a builder with an explicit size and number of hash functions.
    ///
    /// Unlike word-aligned filters, the size is used exactly as given.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_size(100, 3).build().unwrap();
    /// assert_eq!(filter.size(), 100);
    /// assert_eq!(filter.num_hashes(), 3);
    /// ```
    pub fn with_size(num_bits: u64, num_hashes: u16) -> Self {
        BloomFilterBuilder {
            sizing: Sizing::Size {
                num_bits,
                num_hashes,
            },
        }
    }

    /// Creates a builder with an explicit size, picking the number of hash functions that
    /// minimises the false positive rate once `expected_items` items are inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_expected_items(100, 10).build().unwrap();
    /// assert_eq!(filter.num_hashes(), 7);
    /// ```
    pub fn with_expected_items(num_bits: u64, expected_items: u64) -> Self {
        BloomFilterBuilder {
            sizing: Sizing::ExpectedItems {
                num_bits,
                expected_items,
            },
        }
    }

    /// Creates a builder sized for `max_items` insertions at false positive rate `fpp`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_accuracy(1000, 0.01).build().unwrap();
    /// assert_eq!(filter.size(), 9586);
    /// assert_eq!(filter.num_hashes(), 7);
    /// ```
    pub fn with_accuracy(max_items: u64, fpp: f64) -> Self {
        BloomFilterBuilder {
            sizing: Sizing::Accuracy { max_items, fpp },
        }
    }

    /// Builds the Bloom filter.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) error if:
    /// - the size is outside `[MIN_NUM_BITS, MAX_NUM_BITS]`
    /// - the number of hash functions is outside `[MIN_NUM_HASHES, MAX_NUM_HASHES]`
    /// - `max_items` is zero or `fpp` is not in `(0.0, 1.0]` for
    ///   [`with_accuracy()`](Self::with_accuracy)
    pub fn build(self) -> Result<BloomFilter, Error> {
        let (num_bits, num_hashes) = match self.sizing {
            Sizing::Size {
                num_bits,
                num_hashes,
            } => (num_bits, num_hashes),
            Sizing::ExpectedItems {
                num_bits,
                expected_items,
            } => (num_bits, optimal_hash_count(num_bits, expected_items)),
            Sizing::Accuracy { max_items, fpp } => {
                let num_bits = suggest_num_bits(max_items, fpp)?;
                (num_bits, optimal_hash_count(num_bits, max_items))
            }
        };

        validate(num_bits, num_hashes)?;
        debug!("building bloom filter with size={num_bits} num_hashes={num_hashes}");

        Ok(BloomFilter {
            num_hashes,
            bits: BitArray::new(num_bits),
        })
    }
}

pub(crate) fn validate(num_bits: u64, num_hashes: u16) -> Result<(), Error> {
    if !(MIN_NUM_BITS..=MAX_NUM_BITS).contains(&num_bits) {
        return Err(Error::invalid_size(num_bits, MIN_NUM_BITS, MAX_NUM_BITS));
    }
    if !(MIN_NUM_HASHES..=MAX_NUM_HASHES).contains(&num_hashes) {
        return Err(Error::invalid_num_hashes(
            num_hashes,
            MIN_NUM_HASHES,
            MAX_NUM_HASHES,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_with_size() {
        let filter = BloomFilterBuilder::with_size(1024, 5).build().unwrap();
        assert_eq!(filter.size(), 1024);
        assert_eq!(filter.num_hashes(), 5);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_with_size_is_not_word_aligned() {
        let filter = BloomFilterBuilder::with_size(100, 3).build().unwrap();
        assert_eq!(filter.size(), 100);
        assert_eq!(filter.bits().len(), 100);
    }

    #[test]
    fn test_with_expected_items() {
        let filter = BloomFilterBuilder::with_expected_items(1000, 50)
            .build()
            .unwrap();
        assert_eq!(filter.size(), 1000);
        assert_eq!(filter.num_hashes(), 14);

        let filter = BloomFilterBuilder::with_expected_items(1000, 0)
            .build()
            .unwrap();
        assert_eq!(filter.num_hashes(), 1);
    }

    #[test]
    fn test_with_accuracy() {
        let filter = BloomFilterBuilder::with_accuracy(1000, 0.01).build().unwrap();
        assert!(filter.size() >= 9000);
        assert_eq!(filter.num_hashes(), 7);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_invalid_size() {
        let err = BloomFilterBuilder::with_size(0, 3).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.context("size"), Some("0"));

        let err = BloomFilterBuilder::with_size(MAX_NUM_BITS + 1, 3)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_invalid_num_hashes() {
        let err = BloomFilterBuilder::with_size(100, 0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.context("num_hashes"), Some("0"));

        let err = BloomFilterBuilder::with_size(100, MAX_NUM_HASHES + 1)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_invalid_accuracy() {
        let err = BloomFilterBuilder::with_accuracy(0, 0.01)
            .build()
            .unwrap_err();
        assert_eq!(err.message(), "max_items must be greater than 0");

        let err = BloomFilterBuilder::with_accuracy(100, 1.5)
            .build()
            .unwrap_err();
        assert_eq!(err.message(), "fpp must be in (0.0, 1.0]");
    }

    #[test]
    fn test_expected_items_with_zero_size_is_rejected() {
        let err = BloomFilterBuilder::with_expected_items(0, 10)
            .build()
            .unwrap_err();
        assert_eq!(err.context("size"), Some("0"));
    }
}
