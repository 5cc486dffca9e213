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

use std::collections::HashSet;
use std::fmt;

use super::BloomFilter;
use super::trace::StepRecord;

/// How a membership check compares with the items actually added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    /// The filter answered "probably present" and the item was added.
    TruePositive,
    /// The filter answered "probably present" but the item was never added.
    FalsePositive,
    /// The filter answered "definitely not present".
    TrueNegative,
}

impl Membership {
    /// Returns the filter's own answer: `true` for either kind of positive.
    pub fn filter_answer(self) -> bool {
        !matches!(self, Membership::TrueNegative)
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Membership::TruePositive => f.write_str("present (true positive)"),
            Membership::FalsePositive => f.write_str("false positive"),
            Membership::TrueNegative => f.write_str("definitely not present"),
        }
    }
}

/// Summary numbers describing a [`TrackedBloomFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterMetrics {
    /// Theoretical false positive rate for the number of items added so far.
    pub false_positive_probability: f64,
    /// Number of bits set to 1.
    pub bits_set: u64,
    /// Total number of bits.
    pub size: u64,
    /// Items added divided by total bits.
    pub load_factor: f64,
    /// Bits set divided by total bits.
    pub fill_ratio: f64,
}

/// A Bloom filter that also remembers which items were added, so positive answers can be
/// classified as true or false positives.
///
/// The remembered items never influence the filter's own answer.
///
/// # Examples
///
/// ```
/// # use bloomtrace::bloom::BloomFilter;
/// # use bloomtrace::bloom::Membership;
/// # use bloomtrace::bloom::TrackedBloomFilter;
/// let mut tracked = TrackedBloomFilter::new(BloomFilter::new(100, 3).unwrap());
/// tracked.add("apple");
///
/// assert_eq!(tracked.check("apple"), Membership::TruePositive);
/// assert_eq!(tracked.check("elephant"), Membership::TrueNegative);
/// ```
#[derive(Debug, Clone)]
pub struct TrackedBloomFilter {
    filter: BloomFilter,
    inserted: HashSet<Vec<u8>>,
}

impl TrackedBloomFilter {
    /// Wraps `filter`, which is assumed to have no items added yet.
    pub fn new(filter: BloomFilter) -> Self {
        TrackedBloomFilter {
            filter,
            inserted: HashSet::new(),
        }
    }

    /// Adds an item to the filter and records it as inserted.
    pub fn add(&mut self, item: impl AsRef<[u8]>) {
        let item = item.as_ref();
        self.filter.add(item);
        self.remember(item);
    }

    /// Like [`add()`](Self::add), returning the trace of the filter insertion.
    pub fn add_with_steps(&mut self, item: impl AsRef<[u8]>) -> StepRecord {
        let item = item.as_ref();
        let steps = self.filter.add_with_steps(item);
        self.remember(item);
        steps
    }

    /// Checks an item and classifies the filter's answer.
    pub fn check(&self, item: impl AsRef<[u8]>) -> Membership {
        let item = item.as_ref();
        self.classify(item, self.filter.check(item))
    }

    /// Like [`check()`](Self::check), also returning the trace of the filter lookup.
    pub fn check_with_steps(&self, item: impl AsRef<[u8]>) -> (Membership, StepRecord) {
        let item = item.as_ref();
        let (present, steps) = self.filter.check_with_steps(item);
        (self.classify(item, present), steps)
    }

    /// Returns the number of distinct items added.
    pub fn inserted_count(&self) -> u64 {
        self.inserted.len() as u64
    }

    /// Returns whether `item` was actually added.
    pub fn contains_inserted(&self, item: impl AsRef<[u8]>) -> bool {
        self.inserted.contains(item.as_ref())
    }

    /// Returns the underlying filter.
    pub fn filter(&self) -> &BloomFilter {
        &self.filter
    }

    /// Returns summary numbers for display.
    pub fn metrics(&self) -> FilterMetrics {
        let size = self.filter.size();
        FilterMetrics {
            false_positive_probability: self
                .filter
                .false_positive_probability(self.inserted_count()),
            bits_set: self.filter.bits_used(),
            size,
            load_factor: self.inserted_count() as f64 / size as f64,
            fill_ratio: self.filter.fill_ratio(),
        }
    }

    fn remember(&mut self, item: &[u8]) {
        if !self.inserted.contains(item) {
            self.inserted.insert(item.to_vec());
        }
    }

    fn classify(&self, item: &[u8], present: bool) -> Membership {
        match (present, self.inserted.contains(item)) {
            (false, _) => Membership::TrueNegative,
            (true, true) => Membership::TruePositive,
            (true, false) => Membership::FalsePositive,
        }
    }
}
