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
use log::trace;

use super::BitArray;
use super::BloomFilterBuilder;
use super::probability;
use super::trace::Operation;
use super::trace::ProbeObserver;
use super::trace::StepRecord;
use crate::error::Error;
use crate::hash;

/// A Bloom filter for probabilistic set membership testing.
///
/// Provides membership queries with:
/// - No false negatives (added items always return `true`)
/// - A tunable false positive rate
/// - Constant space usage
///
/// Hash function `i` (for `i` in `0..num_hashes`) is MurmurHash3 x86_32 seeded with `i`. Its
/// signed result is mapped onto a bit index with a Euclidean remainder, so negative hashes
/// still select a bit in `[0, size)`.
///
/// Use [`BloomFilter::new`] or [`BloomFilterBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    /// Number of hash functions to use (k)
    pub(super) num_hashes: u16,
    /// The bit array (m = bits.len())
    pub(super) bits: BitArray,
}

impl BloomFilter {
    /// Creates an empty filter with `size` bits and `num_hashes` hash functions.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` or `num_hashes` is zero or above the supported maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// let filter = BloomFilter::new(100, 3).unwrap();
    /// assert_eq!(filter.size(), 100);
    /// assert!(BloomFilter::new(0, 3).is_err());
    /// ```
    pub fn new(size: u64, num_hashes: u16) -> Result<Self, Error> {
        BloomFilterBuilder::with_size(size, num_hashes).build()
    }

    /// Adds an item to the filter.
    ///
    /// After this call, `check(item)` always returns `true`. Adding the same item again does
    /// not change the bit array.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(100, 3).unwrap();
    ///
    /// filter.add("apple");
    /// filter.add(b"raw bytes");
    /// filter.add(String::from("owned"));
    ///
    /// assert!(filter.check("apple"));
    /// ```
    pub fn add(&mut self, item: impl AsRef<[u8]>) {
        self.insert_observed(item.as_ref(), &mut ());
    }

    /// Tests whether an item is possibly in the set.
    ///
    /// Returns:
    /// - `true`: item was **possibly** added (or is a false positive)
    /// - `false`: item was **definitely not** added
    ///
    /// Stops at the first hash function whose bit is unset.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(100, 3).unwrap();
    /// filter.add("apple");
    ///
    /// assert!(filter.check("apple"));
    /// assert!(!filter.check("elephant"));
    /// ```
    pub fn check(&self, item: impl AsRef<[u8]>) -> bool {
        self.probe_observed(item.as_ref(), &mut ())
    }

    /// Adds an item and returns a trace of every hash function evaluated and every bit
    /// touched.
    ///
    /// The resulting bit array is exactly the one [`add()`](Self::add) would produce.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// # use bloomtrace::bloom::Step;
    /// let mut filter = BloomFilter::new(100, 3).unwrap();
    /// let steps = filter.add_with_steps("apple");
    ///
    /// assert_eq!(steps.hashes_evaluated(), 3);
    /// assert!(matches!(steps.steps()[1], Step::Hashed { seed: 0, index: 20, .. }));
    /// ```
    pub fn add_with_steps(&mut self, item: impl AsRef<[u8]>) -> StepRecord {
        let item = item.as_ref();
        let mut record = StepRecord::start(Operation::Add, item, self.num_hashes);
        let bits_before = self.bits.count_set();
        self.insert_observed(item, &mut record);
        trace!(
            "traced add set {} new bits over {} hashes",
            self.bits.count_set() - bits_before,
            self.num_hashes
        );
        record.complete()
    }

    /// Checks an item and returns the answer together with a trace of every hash function
    /// evaluated.
    ///
    /// The trace stops at the same hash function [`check()`](Self::check) stops at, and ends
    /// with either a "definitely not present" or a "probably present" verdict.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// # use bloomtrace::bloom::Step;
    /// let filter = BloomFilter::new(100, 3).unwrap();
    /// let (present, steps) = filter.check_with_steps("apple");
    ///
    /// assert!(!present);
    /// assert_eq!(steps.hashes_evaluated(), 1);
    /// assert!(steps.iter().any(|step| matches!(step, Step::DefinitelyAbsent { .. })));
    /// ```
    pub fn check_with_steps(&self, item: impl AsRef<[u8]>) -> (bool, StepRecord) {
        let item = item.as_ref();
        let mut record = StepRecord::start(Operation::Check, item, self.num_hashes);
        let present = self.probe_observed(item, &mut record);
        trace!(
            "traced check answered {present} after {} of {} hashes",
            record.hashes_evaluated(),
            self.num_hashes
        );
        (present, record.complete())
    }

    /// Tests and adds an item in a single call.
    ///
    /// Returns whether the item was possibly already in the set before this insertion.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new(100, 3).unwrap();
    ///
    /// assert!(!filter.contains_and_add("apple"));
    /// assert!(filter.contains_and_add("apple"));
    /// ```
    pub fn contains_and_add(&mut self, item: impl AsRef<[u8]>) -> bool {
        let item = item.as_ref();
        let was_present = self.probe_observed(item, &mut ());
        self.insert_observed(item, &mut ());
        was_present
    }

    /// Returns the theoretical false positive probability after `inserted_count` distinct
    /// insertions into a filter of this size and hash count.
    ///
    /// This depends only on the configuration, not on which bits happen to be set; see
    /// [`estimated_fpp()`](Self::estimated_fpp) for an estimate from the bit array.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// let filter = BloomFilter::new(100, 3).unwrap();
    /// assert_eq!(filter.false_positive_probability(0), 0.0);
    /// assert!(filter.false_positive_probability(10) > filter.false_positive_probability(5));
    /// ```
    pub fn false_positive_probability(&self, inserted_count: u64) -> f64 {
        probability::fpp_unchecked(self.size(), self.num_hashes, inserted_count)
    }

    /// Returns the number of hash functions minimising the false positive rate for `size`
    /// bits and `expected_inserts` items.
    ///
    /// See [`probability::optimal_hash_count`].
    pub fn optimal_hash_count(size: u64, expected_inserts: u64) -> u16 {
        probability::optimal_hash_count(size, expected_inserts)
    }

    /// Merges another filter into this one via bitwise OR.
    ///
    /// Afterwards this filter recognizes items added to either filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the filters differ in size or number of hash functions.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomtrace::bloom::BloomFilter;
    /// let mut f1 = BloomFilter::new(100, 3).unwrap();
    /// let mut f2 = BloomFilter::new(100, 3).unwrap();
    /// f1.add("a");
    /// f2.add("b");
    ///
    /// f1.union(&f2).unwrap();
    /// assert!(f1.check("a"));
    /// assert!(f1.check("b"));
    /// ```
    pub fn union(&mut self, other: &BloomFilter) -> Result<(), Error> {
        if !self.is_compatible(other) {
            return Err(Error::invalid_argument("cannot union incompatible Bloom filters")
                .with_context("size", self.size())
                .with_context("num_hashes", self.num_hashes)
                .with_context("other_size", other.size())
                .with_context("other_num_hashes", other.num_hashes));
        }
        self.bits.union_with(&other.bits);
        debug!("union left {} of {} bits set", self.bits_used(), self.size());
        Ok(())
    }

    /// Checks if two filters can be merged: same size and number of hash functions.
    pub fn is_compatible(&self, other: &BloomFilter) -> bool {
        self.size() == other.size() && self.num_hashes == other.num_hashes
    }

    /// Returns whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits.count_set() == 0
    }

    /// Returns the total number of bits (m).
    pub fn size(&self) -> u64 {
        self.bits.len()
    }

    /// Returns the number of hash functions (k).
    pub fn num_hashes(&self) -> u16 {
        self.num_hashes
    }

    /// Returns read-only access to the bit array.
    pub fn bits(&self) -> &BitArray {
        &self.bits
    }

    /// Returns the number of bits set to 1.
    pub fn bits_used(&self) -> u64 {
        self.bits.count_set()
    }

    /// Returns the fraction of bits set.
    ///
    /// Values near 0.5 indicate the filter is approaching saturation.
    pub fn fill_ratio(&self) -> f64 {
        self.bits.count_set() as f64 / self.size() as f64
    }

    /// Estimates the current false positive probability from the bit array itself.
    ///
    /// Uses the approximation `fill_ratio^k`, which assumes set bits are spread uniformly.
    pub fn estimated_fpp(&self) -> f64 {
        self.fill_ratio().powf(f64::from(self.num_hashes))
    }

    fn insert_observed<O: ProbeObserver>(&mut self, item: &[u8], observer: &mut O) {
        let size = self.size();
        for seed in 0..u32::from(self.num_hashes) {
            let (hash, index) = hash::probe(item, seed, size);
            observer.hashed(seed, hash, index);
            let newly_set = self.bits.set(index);
            observer.bit_set(index, newly_set);
        }
    }

    fn probe_observed<O: ProbeObserver>(&self, item: &[u8], observer: &mut O) -> bool {
        let size = self.size();
        for seed in 0..u32::from(self.num_hashes) {
            let (hash, index) = hash::probe(item, seed, size);
            observer.hashed(seed, hash, index);
            let value = self.bits.get(index);
            observer.bit_observed(index, value);
            if !value {
                observer.definitely_absent(index);
                return false;
            }
        }
        observer.probably_present();
        true
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::BloomFilter;
    use crate::bloom::Step;
    use crate::error::ErrorKind;

    fn fruit_filter() -> BloomFilter {
        let mut filter = BloomFilter::new(100, 3).unwrap();
        for fruit in ["apple", "banana", "cherry"] {
            filter.add(fruit);
        }
        filter
    }

    fn set_indices(filter: &BloomFilter) -> Vec<u64> {
        (0..filter.size()).filter(|&i| filter.bits().get(i)).collect()
    }

    #[test]
    fn test_new() {
        let filter = BloomFilter::new(100, 3).unwrap();
        assert_eq!(filter.size(), 100);
        assert_eq!(filter.num_hashes(), 3);
        assert!(filter.is_empty());
        assert_eq!(filter.bits_used(), 0);
    }

    #[test]
    fn test_new_rejects_zero_parameters() {
        let err = BloomFilter::new(0, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = BloomFilter::new(100, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_add_and_check() {
        let mut filter = BloomFilter::new(100, 3).unwrap();

        assert!(!filter.check("apple"));
        filter.add("apple");
        assert!(filter.check("apple"));
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_add_sets_expected_bits() {
        let filter = fruit_filter();
        assert_eq!(set_indices(&filter), vec![2, 7, 20, 23, 24, 35, 59, 66, 86]);
        assert_eq!(filter.bits_used(), 9);
    }

    #[test]
    fn test_item_representations_agree() {
        let mut a = BloomFilter::new(100, 3).unwrap();
        let mut b = BloomFilter::new(100, 3).unwrap();
        a.add("apple");
        b.add(b"apple".to_vec());
        assert_eq!(a, b);
        assert!(a.check(String::from("apple")));
    }

    #[test]
    fn test_check_absent_items() {
        let filter = fruit_filter();
        assert!(!filter.check("dog"));
        assert!(!filter.check("cat"));
        assert!(!filter.check("elephant"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut filter = fruit_filter();
        let before = filter.clone();
        filter.add("banana");
        assert_eq!(filter, before);
    }

    #[test]
    fn test_contains_and_add() {
        let mut filter = BloomFilter::new(100, 3).unwrap();
        assert!(!filter.contains_and_add("apple"));
        assert!(filter.contains_and_add("apple"));
        assert_eq!(filter.bits_used(), 3);
    }

    #[test]
    fn test_add_with_steps_trace() {
        let mut filter = BloomFilter::new(100, 3).unwrap();
        let steps = filter.add_with_steps("apple");
        assert_snapshot!(steps, @r"
        starting add for item 'apple' (num_hashes: 3)
          - hash (seed=0): 1880549520 -> index 20
            bit 20 was 0, now set to 1
          - hash (seed=1): -2082288777 -> index 23
            bit 23 was 0, now set to 1
          - hash (seed=2): 21430059 -> index 59
            bit 59 was 0, now set to 1
        completed add
        ");
    }

    #[test]
    fn test_add_with_steps_reports_already_set_bits() {
        let mut filter = fruit_filter();
        let steps = filter.add_with_steps("apple");
        let newly_set: Vec<bool> = steps
            .iter()
            .filter_map(|step| match step {
                Step::BitSet { newly_set, .. } => Some(*newly_set),
                _ => None,
            })
            .collect();
        assert_eq!(newly_set, vec![false, false, false]);
    }

    #[test]
    fn test_check_with_steps_early_exit() {
        let filter = fruit_filter();
        let (present, steps) = filter.check_with_steps("dog");
        assert!(!present);
        assert_eq!(steps.hashes_evaluated(), 2);
        assert_snapshot!(steps, @r"
        starting check for item 'dog' (num_hashes: 3)
          - hash (seed=0): -1312749093 -> index 7
            bit 7 is 1
          - hash (seed=1): -47742704 -> index 96
            bit 96 is 0
            bit 96 is 0, item is definitely not present (early exit)
        completed check
        ");
    }

    #[test]
    fn test_check_with_steps_probably_present() {
        let filter = fruit_filter();
        let (present, steps) = filter.check_with_steps("cherry");
        assert!(present);
        assert_eq!(steps.hashes_evaluated(), 3);
        assert_snapshot!(steps, @r"
        starting check for item 'cherry' (num_hashes: 3)
          - hash (seed=0): -106622534 -> index 66
            bit 66 is 1
          - hash (seed=1): 1577621386 -> index 86
            bit 86 is 1
          - hash (seed=2): 966857402 -> index 2
            bit 2 is 1
        all bits were 1, item is probably present
        completed check
        ");
    }

    #[test]
    fn test_false_positive_probability() {
        let filter = BloomFilter::new(100, 3).unwrap();
        assert_eq!(filter.false_positive_probability(0), 0.0);
        let p3 = filter.false_positive_probability(3);
        let p30 = filter.false_positive_probability(30);
        assert!(0.0 < p3 && p3 < p30 && p30 <= 1.0);
    }

    #[test]
    fn test_optimal_hash_count() {
        assert_eq!(BloomFilter::optimal_hash_count(100, 10), 7);
        assert_eq!(BloomFilter::optimal_hash_count(1000, 50), 14);
        assert_eq!(BloomFilter::optimal_hash_count(1000, 0), 1);
    }

    #[test]
    fn test_union() {
        let mut f1 = BloomFilter::new(100, 3).unwrap();
        let mut f2 = BloomFilter::new(100, 3).unwrap();
        f1.add("apple");
        f2.add("banana");
        f2.add("cherry");

        f1.union(&f2).unwrap();
        assert_eq!(f1, fruit_filter());
    }

    #[test]
    fn test_union_incompatible() {
        let mut f1 = BloomFilter::new(100, 3).unwrap();
        let f2 = BloomFilter::new(100, 4).unwrap();
        let f3 = BloomFilter::new(101, 3).unwrap();

        assert!(!f1.is_compatible(&f2));
        assert!(!f1.is_compatible(&f3));
        let err = f1.union(&f2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.context("other_num_hashes"), Some("4"));
        assert!(f1.is_empty());
    }

    #[test]
    fn test_statistics() {
        let mut filter = BloomFilter::new(1000, 5).unwrap();
        assert_eq!(filter.bits_used(), 0);
        assert_eq!(filter.fill_ratio(), 0.0);
        assert_eq!(filter.estimated_fpp(), 0.0);

        filter.add("test");
        assert!(filter.bits_used() > 0);
        assert!(filter.fill_ratio() > 0.0);
        assert!(filter.estimated_fpp() > 0.0);
    }

    #[test]
    fn test_single_bit_filter() {
        let mut filter = BloomFilter::new(1, 4).unwrap();
        assert!(!filter.check("anything"));
        filter.add("x");
        assert!(filter.check("anything"));
        assert_eq!(filter.fill_ratio(), 1.0);
    }
}
