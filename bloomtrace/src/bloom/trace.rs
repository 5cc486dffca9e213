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

use std::fmt;

/// The filter operation a [`StepRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`BloomFilter::add_with_steps`](super::BloomFilter::add_with_steps)
    Add,
    /// [`BloomFilter::check_with_steps`](super::BloomFilter::check_with_steps)
    Check,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => f.write_str("add"),
            Operation::Check => f.write_str("check"),
        }
    }
}

/// One observable event of a traced filter operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The operation began.
    Started {
        /// Which operation is running.
        operation: Operation,
        /// The item, decoded lossily as UTF-8.
        item: String,
        /// Number of hash functions the filter applies.
        num_hashes: u16,
    },
    /// Hash function `seed` was evaluated and mapped to a bit index.
    Hashed {
        /// The hash function's seed.
        seed: u32,
        /// The raw signed hash value.
        hash: i32,
        /// The derived bit index.
        index: u64,
    },
    /// `add` visited a bit: either it flipped from 0 to 1, or it was already 1.
    BitSet {
        /// The bit index.
        index: u64,
        /// Whether the bit was 0 before this operation.
        newly_set: bool,
    },
    /// `check` read a bit.
    BitObserved {
        /// The bit index.
        index: u64,
        /// The bit value.
        value: bool,
    },
    /// `check` found an unset bit and stopped: the item was never added.
    DefinitelyAbsent {
        /// The unset bit index that ended the check.
        index: u64,
    },
    /// `check` found every bit set: the item was added or is a false positive.
    ProbablyPresent,
    /// The operation finished.
    Completed {
        /// Which operation finished.
        operation: Operation,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Started {
                operation,
                item,
                num_hashes,
            } => write!(f, "starting {operation} for item '{item}' (num_hashes: {num_hashes})"),
            Step::Hashed { seed, hash, index } => {
                write!(f, "hash (seed={seed}): {hash} -> index {index}")
            }
            Step::BitSet {
                index,
                newly_set: true,
            } => write!(f, "bit {index} was 0, now set to 1"),
            Step::BitSet {
                index,
                newly_set: false,
            } => write!(f, "bit {index} was already 1, remains 1"),
            Step::BitObserved { index, value } => write!(f, "bit {index} is {}", u8::from(*value)),
            Step::DefinitelyAbsent { index } => write!(
                f,
                "bit {index} is 0, item is definitely not present (early exit)"
            ),
            Step::ProbablyPresent => f.write_str("all bits were 1, item is probably present"),
            Step::Completed { operation } => write!(f, "completed {operation}"),
        }
    }
}

/// The ordered trace of one traced [`add`](super::BloomFilter::add_with_steps) or
/// [`check`](super::BloomFilter::check_with_steps).
///
/// A record is purely observational; nothing in the filter reads it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    operation: Operation,
    steps: Vec<Step>,
}

impl StepRecord {
    pub(crate) fn start(operation: Operation, item: &[u8], num_hashes: u16) -> Self {
        // started + (hashed, bit) per seed + verdict + completed
        let mut steps = Vec::with_capacity(2 * usize::from(num_hashes) + 3);
        steps.push(Step::Started {
            operation,
            item: String::from_utf8_lossy(item).into_owned(),
            num_hashes,
        });
        StepRecord { operation, steps }
    }

    pub(crate) fn complete(mut self) -> Self {
        self.steps.push(Step::Completed {
            operation: self.operation,
        });
        self
    }

    /// Returns the operation this record traces.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns the steps in the order they happened.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns an iterator over the steps.
    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the record holds no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns how many hash functions the operation evaluated.
    pub fn hashes_evaluated(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Hashed { .. }))
            .count()
    }
}

impl<'a> IntoIterator for &'a StepRecord {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match step {
                Step::Hashed { .. } => write!(f, "  - {step}")?,
                Step::BitSet { .. } | Step::BitObserved { .. } | Step::DefinitelyAbsent { .. } => {
                    write!(f, "    {step}")?
                }
                _ => write!(f, "{step}")?,
            }
        }
        Ok(())
    }
}

/// Receives the events of the shared probe loop in
/// [`BloomFilter`](super::BloomFilter).
///
/// The untraced operations use the no-op `()` observer, so tracing never changes which bits
/// are read or written.
pub(crate) trait ProbeObserver {
    fn hashed(&mut self, seed: u32, hash: i32, index: u64);
    fn bit_set(&mut self, index: u64, newly_set: bool);
    fn bit_observed(&mut self, index: u64, value: bool);
    fn definitely_absent(&mut self, index: u64);
    fn probably_present(&mut self);
}

impl ProbeObserver for () {
    #[inline]
    fn hashed(&mut self, _seed: u32, _hash: i32, _index: u64) {}
    #[inline]
    fn bit_set(&mut self, _index: u64, _newly_set: bool) {}
    #[inline]
    fn bit_observed(&mut self, _index: u64, _value: bool) {}
    #[inline]
    fn definitely_absent(&mut self, _index: u64) {}
    #[inline]
    fn probably_present(&mut self) {}
}

impl ProbeObserver for StepRecord {
    fn hashed(&mut self, seed: u32, hash: i32, index: u64) {
        self.steps.push(Step::Hashed { seed, hash, index });
    }

    fn bit_set(&mut self, index: u64, newly_set: bool) {
        self.steps.push(Step::BitSet { index, newly_set });
    }

    fn bit_observed(&mut self, index: u64, value: bool) {
        self.steps.push(Step::BitObserved { index, value });
    }

    fn definitely_absent(&mut self, index: u64) {
        self.steps.push(Step::DefinitelyAbsent { index });
    }

    fn probably_present(&mut self) {
        self.steps.push(Step::ProbablyPresent);
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn test_step_display() {
        assert_snapshot!(Step::Hashed { seed: 2, hash: -5, index: 95 }, @"hash (seed=2): -5 -> index 95");
        assert_snapshot!(Step::BitSet { index: 4, newly_set: true }, @"bit 4 was 0, now set to 1");
        assert_snapshot!(Step::BitSet { index: 4, newly_set: false }, @"bit 4 was already 1, remains 1");
        assert_snapshot!(Step::BitObserved { index: 9, value: false }, @"bit 9 is 0");
        assert_snapshot!(Step::ProbablyPresent, @"all bits were 1, item is probably present");
    }

    #[test]
    fn test_start_decodes_item_lossily() {
        let record = StepRecord::start(Operation::Check, &[b'o', b'k', 0xff], 4);
        assert_eq!(record.operation(), Operation::Check);
        assert_eq!(
            record.steps(),
            &[Step::Started {
                operation: Operation::Check,
                item: "ok\u{fffd}".to_string(),
                num_hashes: 4,
            }]
        );
    }

    #[test]
    fn test_observer_records_in_order() {
        let mut record = StepRecord::start(Operation::Check, b"x", 2);
        record.hashed(0, 10, 10);
        record.bit_observed(10, true);
        record.hashed(1, -3, 7);
        record.bit_observed(7, false);
        record.definitely_absent(7);
        let record = record.complete();

        assert_eq!(record.len(), 7);
        assert_eq!(record.hashes_evaluated(), 2);
        assert_eq!(
            record.steps().last(),
            Some(&Step::Completed {
                operation: Operation::Check
            })
        );
        assert_snapshot!(record, @r"
        starting check for item 'x' (num_hashes: 2)
          - hash (seed=0): 10 -> index 10
            bit 10 is 1
          - hash (seed=1): -3 -> index 7
            bit 7 is 0
            bit 7 is 0, item is definitely not present (early exit)
        completed check
        ");
    }
}
