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

//! Replays a small add/check session and prints the trace of every decision.
//!
//! Run with `RUST_LOG=trace cargo run --example walkthrough` to also see the filter's logs.

use bloomtrace::bloom::BloomFilter;
use bloomtrace::bloom::Membership;
use bloomtrace::bloom::TrackedBloomFilter;

fn main() {
    env_logger::init();

    // 100 bits, 3 hash functions
    let filter = BloomFilter::new(100, 3).unwrap();
    let mut session = TrackedBloomFilter::new(filter);

    println!("Adding elements...");
    for fruit in ["apple", "banana", "cherry"] {
        let steps = session.add_with_steps(fruit);
        println!("{steps}\n");
    }

    println!("Checking added elements (all must be present):");
    for fruit in ["apple", "banana", "cherry"] {
        println!("{fruit}: {}", session.check(fruit));
    }

    println!("\nChecking other elements (false positives possible):");
    for animal in ["dog", "cat", "elephant"] {
        let (membership, steps) = session.check_with_steps(animal);
        println!("{steps}");
        if membership == Membership::FalsePositive {
            println!("=> {animal} is a false positive!");
        }
        println!();
    }

    let metrics = session.metrics();
    println!(
        "False positive probability: {:.2}%",
        metrics.false_positive_probability * 100.0
    );
    println!("Bits set: {}/{}", metrics.bits_set, metrics.size);
    println!("Load factor: {:.2}", metrics.load_factor);
    println!(
        "Optimal hash count for {} items: {}",
        session.inserted_count(),
        BloomFilter::optimal_hash_count(metrics.size, session.inserted_count())
    );
}
