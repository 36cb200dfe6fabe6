// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seedable pseudo-random number generators for deterministic trajectories.
//!
//! Determinism contract:
//! - A given `(RngKind, seed)` produces a byte-identical draw sequence across
//!   runs on the same platform.
//! - All stochastic choices in the engine (process pick, site pick, waiting
//!   time, redistribution shuffles) consume this stream and nothing else; the
//!   engine holds no global generator state.
//!
//! The four deterministic generators are implemented here rather than pulled
//! from a crate: the `rand` ecosystem does not ship MINSTD or the RANLUX
//! family, and mixing crate-provided and hand-rolled engines would split the
//! seeding conventions. They expose themselves through [`RngCore`], so every
//! draw the engine makes goes through `rand` / `rand_distr` distributions on
//! top.
//!
//! `DEVICE` wraps the operating-system entropy source and is intentionally
//! not reproducible.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::Error;

/// Selection of the pseudo-random number generator backing a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RngKind {
    /// Mersenne-Twister, 32-bit flavour. The default.
    Mt,
    /// The "minimum standard" multiplicative congruential generator.
    Minstd,
    /// 24-bit RANLUX (subtract-with-carry with luxury discard).
    Ranlux24,
    /// 48-bit RANLUX.
    Ranlux48,
    /// The operating-system nondeterministic source. May be unsupported;
    /// probed at construction.
    Device,
}

impl Default for RngKind {
    fn default() -> Self {
        Self::Mt
    }
}

impl std::fmt::Display for RngKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mt => "MT",
            Self::Minstd => "MINSTD",
            Self::Ranlux24 => "RANLUX24",
            Self::Ranlux48 => "RANLUX48",
            Self::Device => "DEVICE",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for RngKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MT" => Ok(Self::Mt),
            "MINSTD" => Ok(Self::Minstd),
            "RANLUX24" => Ok(Self::Ranlux24),
            "RANLUX48" => Ok(Self::Ranlux48),
            "DEVICE" => Ok(Self::Device),
            other => Err(Error::validation(format!(
                "unknown rng_type '{other}'; supported: MT, MINSTD, RANLUX24, RANLUX48, DEVICE"
            ))),
        }
    }
}

const MT_N: usize = 624;
const MT_M: usize = 397;
const MT_MATRIX_A: u32 = 0x9908_b0df;
const MT_UPPER_MASK: u32 = 0x8000_0000;
const MT_LOWER_MASK: u32 = 0x7fff_ffff;

/// MT19937 with the standard initialization and tempering.
#[derive(Clone)]
struct Mt19937 {
    state: Box<[u32; MT_N]>,
    index: usize,
}

impl Mt19937 {
    fn new(seed: u32) -> Self {
        let mut state = Box::new([0u32; MT_N]);
        state[0] = seed;
        for i in 1..MT_N {
            let prev = state[i - 1];
            state[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self {
            state,
            index: MT_N,
        }
    }

    fn twist(&mut self) {
        for i in 0..MT_N {
            let y = (self.state[i] & MT_UPPER_MASK) | (self.state[(i + 1) % MT_N] & MT_LOWER_MASK);
            let mut next = self.state[(i + MT_M) % MT_N] ^ (y >> 1);
            if y & 1 == 1 {
                next ^= MT_MATRIX_A;
            }
            self.state[i] = next;
        }
        self.index = 0;
    }

    fn next(&mut self) -> u32 {
        if self.index >= MT_N {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
    }
}

const MINSTD_A: u64 = 48_271;
const MINSTD_M: u64 = 2_147_483_647;

/// Park–Miller multiplicative congruential generator (multiplier 48271).
///
/// Native output is 31 bits; `next_u32` widens by combining the middle 16
/// bits of two consecutive draws so the stream stays uniform over `u32`.
#[derive(Clone)]
struct Minstd {
    x: u64,
}

impl Minstd {
    fn new(seed: u32) -> Self {
        let mut x = u64::from(seed) % MINSTD_M;
        if x == 0 {
            x = 1;
        }
        Self { x }
    }

    fn next(&mut self) -> u32 {
        self.x = self.x * MINSTD_A % MINSTD_M;
        self.x as u32
    }

    fn next_wide(&mut self) -> u32 {
        let hi = (self.next() >> 7) & 0xffff;
        let lo = (self.next() >> 7) & 0xffff;
        (hi << 16) | lo
    }
}

/// Subtract-with-carry engine, the RANLUX base generator.
///
/// `x_i = (x_{i-s} - x_{i-r} - c) mod 2^w` with short lag `s` and long lag
/// `r`; the carry is the borrow of the subtraction. Seeded by a Lehmer
/// generator filling the initial lag window word by word.
#[derive(Clone)]
struct SubtractWithCarry {
    x: Vec<u64>,
    carry: u64,
    k: usize,
    word_bits: u32,
    short_lag: usize,
}

const SWC_SEED_A: u64 = 40_014;
const SWC_SEED_M: u64 = 2_147_483_563;
const SWC_DEFAULT_SEED: u64 = 19_780_503;

impl SubtractWithCarry {
    fn new(word_bits: u32, short_lag: usize, long_lag: usize, seed: u32) -> Self {
        let mut lcg = u64::from(seed) % SWC_SEED_M;
        if lcg == 0 {
            lcg = SWC_DEFAULT_SEED;
        }
        let mut draw = move || {
            lcg = lcg * SWC_SEED_A % SWC_SEED_M;
            lcg
        };
        let mask = (1u64 << word_bits) - 1;
        let mut x = Vec::with_capacity(long_lag);
        for _ in 0..long_lag {
            // Words wider than one Lehmer draw are filled 32 bits at a time.
            let mut word = draw();
            if word_bits > 32 {
                word |= draw() << 32;
            }
            x.push(word & mask);
        }
        let carry = u64::from(x[long_lag - 1] == 0);
        Self {
            x,
            carry,
            k: 0,
            word_bits,
            short_lag,
        }
    }

    fn next(&mut self) -> u64 {
        let long_lag = self.x.len();
        let xs = self.x[(self.k + long_lag - self.short_lag) % long_lag];
        let xr = self.x[self.k];
        let modulus = 1u64 << self.word_bits;
        let (y, borrowed) = {
            let lhs = xs.wrapping_sub(xr).wrapping_sub(self.carry);
            if xs >= xr + self.carry {
                (lhs, 0)
            } else {
                (lhs.wrapping_add(modulus) & (modulus - 1), 1)
            }
        };
        self.carry = borrowed;
        self.x[self.k] = y;
        self.k = (self.k + 1) % long_lag;
        y
    }
}

/// Luxury discard wrapper: keep `used` values per block of `block` draws.
#[derive(Clone)]
struct DiscardBlock {
    base: SubtractWithCarry,
    block: usize,
    used: usize,
    position: usize,
}

impl DiscardBlock {
    fn new(base: SubtractWithCarry, block: usize, used: usize) -> Self {
        Self {
            base,
            block,
            used,
            position: 0,
        }
    }

    fn next(&mut self) -> u64 {
        if self.position >= self.used {
            for _ in 0..self.block - self.used {
                let _ = self.base.next();
            }
            self.position = 0;
        }
        self.position += 1;
        self.base.next()
    }
}

enum Engine {
    Mt(Mt19937),
    Minstd(Minstd),
    Ranlux24(DiscardBlock),
    Ranlux48(DiscardBlock),
    Device(OsRng),
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mt(_) => "Mt",
            Self::Minstd(_) => "Minstd",
            Self::Ranlux24(_) => "Ranlux24",
            Self::Ranlux48(_) => "Ranlux48",
            Self::Device(_) => "Device",
        };
        f.debug_struct("Engine").field("kind", &name).finish()
    }
}

/// The simulation generator threaded through the driver.
///
/// Implements [`RngCore`]; all engine draws go through `rand` distributions
/// on top of this. Constructing the `Device` kind probes the OS entropy
/// source and fails with [`Error::UnsupportedPrng`] when it is unavailable.
#[derive(Debug)]
pub struct SimRng {
    kind: RngKind,
    engine: Engine,
}

impl SimRng {
    /// Builds a generator of the requested kind from a seed.
    ///
    /// The seed is truncated to 32 bits for the deterministic engines, which
    /// is the width their seeding procedures consume. `Device` ignores the
    /// seed.
    pub fn new(kind: RngKind, seed: u64) -> Result<Self, Error> {
        let seed32 = seed as u32;
        let engine = match kind {
            RngKind::Mt => Engine::Mt(Mt19937::new(seed32)),
            RngKind::Minstd => Engine::Minstd(Minstd::new(seed32)),
            RngKind::Ranlux24 => Engine::Ranlux24(DiscardBlock::new(
                SubtractWithCarry::new(24, 10, 24, seed32),
                223,
                23,
            )),
            RngKind::Ranlux48 => Engine::Ranlux48(DiscardBlock::new(
                SubtractWithCarry::new(48, 5, 12, seed32),
                389,
                11,
            )),
            RngKind::Device => {
                let mut probe = [0u8; 8];
                OsRng
                    .try_fill_bytes(&mut probe)
                    .map_err(|_| Error::UnsupportedPrng)?;
                Engine::Device(OsRng)
            }
        };
        Ok(Self { kind, engine })
    }

    /// The generator kind this stream was built with.
    pub fn kind(&self) -> RngKind {
        self.kind
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        match &mut self.engine {
            Engine::Mt(e) => e.next(),
            Engine::Minstd(e) => e.next_wide(),
            // 24 uniform bits from the first draw, topped up with 8 from the
            // second; both words are uniform over their width.
            Engine::Ranlux24(e) => {
                let hi = (e.next() as u32) << 8;
                let lo = (e.next() as u32) & 0xff;
                hi | lo
            }
            Engine::Ranlux48(e) => e.next() as u32,
            Engine::Device(e) => e.next_u32(),
        }
    }

    fn next_u64(&mut self) -> u64 {
        // 48 bits per RANLUX48 draw; two draws cover a u64.
        if let Engine::Ranlux48(e) = &mut self.engine {
            let hi = e.next() << 16;
            let lo = e.next() & 0xffff;
            return hi | lo;
        }
        if let Engine::Device(e) = &mut self.engine {
            return e.next_u64();
        }
        let lo = u64::from(self.next_u32());
        let hi = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let word = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
