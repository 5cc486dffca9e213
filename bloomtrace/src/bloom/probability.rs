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

//! Closed-form estimates used to tune Bloom filter parameters.
//!
//! These are pure functions of the filter configuration; they do not look at any bit array.

use std::f64::consts::LN_2;

use super::builder::MAX_NUM_BITS;
use super::builder::MAX_NUM_HASHES;
use super::builder::MIN_NUM_BITS;
use super::builder::MIN_NUM_HASHES;
use crate::error::Error;

/// Returns the theoretical false positive probability of a filter with `size` bits and
/// `num_hashes` hash functions after `inserted` distinct insertions.
///
/// Formula: `(1 - e^(-k * n / m))^k`, and exactly `0.0` when `n == 0`.
///
/// # Errors
///
/// Returns an error if `size` or `num_hashes` is zero.
///
/// # Examples
///
/// ```
/// # use bloomtrace::bloom::probability::false_positive_probability;
/// assert_eq!(false_positive_probability(100, 3, 0).unwrap(), 0.0);
///
/// let p = false_positive_probability(100, 3, 3).unwrap();
/// assert!(p > 0.0006 && p < 0.0007);
/// ```
pub fn false_positive_probability(size: u64, num_hashes: u16, inserted: u64) -> Result<f64, Error> {
    if size < MIN_NUM_BITS {
        return Err(Error::invalid_size(size, MIN_NUM_BITS, MAX_NUM_BITS));
    }
    if num_hashes < MIN_NUM_HASHES {
        return Err(Error::invalid_num_hashes(num_hashes, MIN_NUM_HASHES, MAX_NUM_HASHES));
    }
    Ok(fpp_unchecked(size, num_hashes, inserted))
}

/// Formula body shared with [`BloomFilter`](super::BloomFilter), whose parameters are
/// validated at construction.
pub(crate) fn fpp_unchecked(size: u64, num_hashes: u16, inserted: u64) -> f64 {
    if inserted == 0 {
        return 0.0;
    }
    let k = f64::from(num_hashes);
    let n = inserted as f64;
    let m = size as f64;

    // -expm1(x) = 1 - e^x, without cancellation for small loads.
    let fill = -(-k * n / m).exp_m1();
    fill.powf(k).clamp(0.0, 1.0)
}

/// Returns the number of hash functions that minimises the false positive probability of a
/// filter with `size` bits holding `expected_inserts` items.
///
/// Formula: `k = (m / n) * ln(2)`, rounded to the nearest integer with ties to even, then
/// clamped to at least 1. Returns `1` when `expected_inserts == 0`.
///
/// # Examples
///
/// ```
/// # use bloomtrace::bloom::probability::optimal_hash_count;
/// assert_eq!(optimal_hash_count(100, 10), 7); // 6.93
/// assert_eq!(optimal_hash_count(1000, 50), 14); // 13.86
/// assert_eq!(optimal_hash_count(100, 0), 1);
/// ```
pub fn optimal_hash_count(size: u64, expected_inserts: u64) -> u16 {
    if expected_inserts == 0 {
        return 1;
    }
    let m = size as f64;
    let n = expected_inserts as f64;

    let k = (m / n * LN_2).round_ties_even();
    k.clamp(f64::from(MIN_NUM_HASHES), f64::from(MAX_NUM_HASHES)) as u16
}

/// Suggests the number of bits needed to hold `max_items` at false positive rate `fpp`.
///
/// Formula: `m = -n * ln(p) / (ln(2)^2)`, rounded up and clamped to the supported size range.
///
/// # Errors
///
/// Returns an error if `max_items` is zero or `fpp` is not in `(0.0, 1.0]`.
///
/// # Examples
///
/// ```
/// # use bloomtrace::bloom::probability::suggest_num_bits;
/// let bits = suggest_num_bits(1000, 0.01).unwrap();
/// assert_eq!(bits, 9586);
/// ```
pub fn suggest_num_bits(max_items: u64, fpp: f64) -> Result<u64, Error> {
    if max_items == 0 {
        return Err(Error::invalid_argument("max_items must be greater than 0"));
    }
    if !(fpp > 0.0 && fpp <= 1.0) {
        return Err(
            Error::invalid_argument("fpp must be in (0.0, 1.0]").with_context("fpp", fpp)
        );
    }

    let n = max_items as f64;
    let bits = (-n * fpp.ln() / (LN_2 * LN_2)).ceil();
    Ok((bits as u64).clamp(MIN_NUM_BITS, MAX_NUM_BITS))
}

#[cfg(test)]
mod tests {
    use googletest::assert_that;
    use googletest::prelude::near;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_fpp_zero_inserts_is_exactly_zero() {
        assert_eq!(false_positive_probability(100, 3, 0).unwrap(), 0.0);
        assert_eq!(false_positive_probability(1, 1, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_fpp_known_value() {
        // (1 - e^(-0.09))^3
        let p = false_positive_probability(100, 3, 3).unwrap();
        assert_that!(p, near(0.000_637_58, 1e-7));

        // (1 - e^(-1))^1
        let p = false_positive_probability(10, 1, 10).unwrap();
        assert_that!(p, near(0.632_120_56, 1e-7));
    }

    #[test]
    fn test_fpp_strictly_increasing() {
        let mut last = 0.0;
        for n in 1..200 {
            let p = false_positive_probability(1000, 5, n).unwrap();
            assert!(p > last, "not increasing at n = {n}");
            assert!(p <= 1.0);
            last = p;
        }
    }

    #[test]
    fn test_fpp_saturates_within_unit_interval() {
        let p = false_positive_probability(10, 4, u64::MAX).unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert_that!(p, near(1.0, 1e-12));
    }

    #[test]
    fn test_fpp_rejects_invalid_configuration() {
        let err = false_positive_probability(0, 3, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.context("size"), Some("0"));

        let err = false_positive_probability(100, 0, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.context("num_hashes"), Some("0"));
    }

    #[test]
    fn test_optimal_hash_count_known_values() {
        assert_eq!(optimal_hash_count(100, 10), 7);
        assert_eq!(optimal_hash_count(1000, 50), 14);
        assert_eq!(optimal_hash_count(9586, 1000), 7);
        assert_eq!(optimal_hash_count(100, 0), 1);
        assert_eq!(optimal_hash_count(0, 0), 1);
    }

    #[test]
    fn test_optimal_hash_count_never_zero() {
        // (10 / 100) * ln(2) = 0.069
        assert_eq!(optimal_hash_count(10, 100), 1);
        assert_eq!(optimal_hash_count(0, 5), 1);
    }

    #[test]
    fn test_optimal_hash_count_clamps_to_max() {
        assert_eq!(optimal_hash_count(u64::MAX, 1), MAX_NUM_HASHES);
    }

    #[test]
    fn test_suggest_num_bits() {
        assert_eq!(suggest_num_bits(1000, 0.01).unwrap(), 9586);
        assert_eq!(suggest_num_bits(1, 1.0).unwrap(), MIN_NUM_BITS);
    }

    #[test]
    fn test_suggest_num_bits_rejects_invalid_arguments() {
        assert!(suggest_num_bits(0, 0.01).is_err());
        assert!(suggest_num_bits(10, 0.0).is_err());
        assert!(suggest_num_bits(10, 1.5).is_err());
        assert!(suggest_num_bits(10, f64::NAN).is_err());
    }
}
