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

//! A classic Bloom filter whose decisions can be traced step by step.
//!
//! A Bloom filter tests whether an element is a member of a set. False positive matches are
//! possible, but false negatives are not: a query returns either "possibly in set" or
//! "definitely not in set".
//!
//! # Properties
//!
//! - **No false negatives**: if an item was added, `check()` always returns `true`
//! - **Possible false positives**: `check()` may return `true` for items never added
//! - **Fixed size**: the bit array never grows
//! - **Monotonic**: bits are only ever set; there is no removal
//!
//! # Usage
//!
//! ```rust
//! use bloomtrace::bloom::BloomFilter;
//!
//! let mut filter = BloomFilter::new(100, 3).unwrap();
//!
//! filter.add("apple");
//! filter.add("banana");
//!
//! assert!(filter.check("apple")); // true - added
//! assert!(!filter.check("elephant")); // false - never added
//!
//! println!("Bits set: {}/{}", filter.bits_used(), filter.size());
//! println!("FPP after 2 items: {:.4}%", filter.false_positive_probability(2) * 100.0);
//! ```
//!
//! # Tracing
//!
//! [`BloomFilter::add_with_steps`] and [`BloomFilter::check_with_steps`] behave exactly like
//! `add` and `check` but also return a [`StepRecord`] listing every hash evaluated and every
//! bit touched, which renders as readable text:
//!
//! ```rust
//! # use bloomtrace::bloom::BloomFilter;
//! let mut filter = BloomFilter::new(100, 3).unwrap();
//! filter.add("apple");
//!
//! let (present, steps) = filter.check_with_steps("elephant");
//! assert!(!present);
//! println!("{steps}");
//! ```
//!
//! # Creating Filters
//!
//! [`BloomFilter::new`] takes the size and hash count directly. [`BloomFilterBuilder`] can
//! also derive them:
//!
//! ```rust
//! # use bloomtrace::bloom::BloomFilterBuilder;
//! // 1000 bits, hash count tuned for 50 insertions
//! let filter = BloomFilterBuilder::with_expected_items(1000, 50).build().unwrap();
//! assert_eq!(filter.num_hashes(), 14);
//!
//! // sized for 10,000 items at a 1% false positive rate
//! let filter = BloomFilterBuilder::with_accuracy(10_000, 0.01).build().unwrap();
//! ```
//!
//! # Other Front Ends
//!
//! - [`TrackedBloomFilter`] remembers added items and classifies each check as a true
//!   positive, false positive or true negative.
//! - [`ConcurrentBloomFilter`] accepts adds and checks from many threads at once.
//!
//! # References
//!
//! - Bloom, Burton H. (1970). "Space/time trade-offs in hash coding with allowable errors"

mod bit_array;
mod builder;
mod concurrent;
pub mod probability;
mod sketch;
mod trace;
mod tracked;

pub use self::bit_array::BitArray;
pub use self::builder::BloomFilterBuilder;
pub use self::builder::MAX_NUM_BITS;
pub use self::builder::MAX_NUM_HASHES;
pub use self::builder::MIN_NUM_BITS;
pub use self::builder::MIN_NUM_HASHES;
pub use self::concurrent::ConcurrentBloomFilter;
pub use self::sketch::BloomFilter;
pub use self::trace::Operation;
pub use self::trace::Step;
pub use self::trace::StepRecord;
pub use self::tracked::FilterMetrics;
pub use self::tracked::Membership;
pub use self::tracked::TrackedBloomFilter;
