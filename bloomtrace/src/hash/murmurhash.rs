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

use std::hash::Hasher;

use byteorder::ByteOrder;
use byteorder::LE;

const C1: u32 = 0xcc9e2d51;
const C2: u32 = 0x1b873593;

/// The MurmurHash3 x86 32-bit variant: a fast, non-cryptographic hash with good avalanche
/// behaviour, keyed by a 32-bit seed.
///
/// Input may be written in several pieces; the result only depends on the concatenated bytes.
#[derive(Debug, Clone)]
pub struct MurmurHash3X86_32 {
    h1: u32,
    total: u64,
    buf: [u8; 4],
    buf_len: usize,
}

impl MurmurHash3X86_32 {
    pub fn with_seed(seed: u32) -> Self {
        MurmurHash3X86_32 {
            h1: seed,
            total: 0,
            buf: [0; 4],
            buf_len: 0,
        }
    }

    pub fn finish32(&self) -> u32 {
        let mut h1 = self.h1;
        let rem = self.buf_len;

        // tail
        if rem > 0 {
            let mut buf = [0u8; 4];
            buf[..rem].copy_from_slice(&self.buf[..rem]);
            h1 ^= mix_k1(u32::from_le_bytes(buf));
        }

        // The reference algorithm folds in the length modulo 2^32.
        h1 ^= (self.total + rem as u64) as u32;
        fmix32(h1)
    }

    #[inline]
    fn update(&mut self, k1: u32) {
        self.h1 ^= mix_k1(k1);
        self.h1 = self.h1.rotate_left(13);
        self.h1 = self.h1.wrapping_mul(5).wrapping_add(0xe6546b64);
        self.total += 4;
    }
}

impl Hasher for MurmurHash3X86_32 {
    fn finish(&self) -> u64 {
        u64::from(self.finish32())
    }

    fn write(&mut self, mut bytes: &[u8]) {
        if self.buf_len + bytes.len() < 4 {
            self.buf[self.buf_len..self.buf_len + bytes.len()].copy_from_slice(bytes);
            self.buf_len += bytes.len();
            return;
        }

        if self.buf_len != 0 {
            let wanted = 4 - self.buf_len;
            self.buf[self.buf_len..].copy_from_slice(&bytes[..wanted]);
            let k1 = LE::read_u32(&self.buf);
            self.update(k1);

            bytes = &bytes[wanted..];
            self.buf_len = 0;
        }

        let blocks = bytes.len() >> 2; // bytes / 4
        for i in 0..blocks {
            let lo = i << 2;
            let k1 = LE::read_u32(&bytes[lo..lo + 4]);
            self.update(k1);
        }

        let len = bytes.len() % 4;
        if len > 0 {
            self.buf[..len].copy_from_slice(&bytes[blocks << 2..]);
            self.buf_len = len;
        }
    }
}

#[inline]
fn mix_k1(mut k1: u32) -> u32 {
    k1 = k1.wrapping_mul(C1);
    k1 = k1.rotate_left(15);
    k1.wrapping_mul(C2)
}

/// Finalization mix: force all bits of a hash block to avalanche.
#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^ (h >> 16)
}
