//! Deterministic random number generation.
//!
//! RULE: Nothing in the pipeline may call any platform RNG.
//! All randomness is derived from the project seed plus a descriptive key
//! (role + identifiers + period). There is no shared generator state, so
//! results never depend on call order:
//!   - Adding a new stage never changes existing stages' values.
//!   - Any single value can be re-derived in isolation from its key.
//!
//! The supporting generators (calendar, ages, growth curve) need many draws
//! from one logical key; they get a `StreamRng` seeded from `stable_seed`.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use sha2::{Digest, Sha256};

const MANTISSA_MASK: u64 = (1 << 53) - 1;
const MANTISSA_SCALE: f64 = (1u64 << 53) as f64;

/// Floor for the first Box–Muller uniform, keeps `ln` finite.
const BOX_MULLER_EPSILON: f64 = 1e-12;

/// Keyed, stateless randomness bound to the project seed.
#[derive(Debug, Clone)]
pub struct KeyedRng {
    seed: String,
}

impl KeyedRng {
    pub fn new(seed: impl Into<String>) -> Self {
        Self { seed: seed.into() }
    }

    /// Uniform value in [0.0, 1.0) for `key`.
    pub fn uniform(&self, key: &str) -> f64 {
        let digest = Sha256::digest(format!("{}|{}", self.seed, key).as_bytes());
        let n = first_u64(&digest);
        (n & MANTISSA_MASK) as f64 / MANTISSA_SCALE
    }

    /// Uniform value in [lo, hi) for `key`.
    pub fn uniform_range(&self, key: &str, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.uniform(key)
    }

    /// Multiplicative perturbation `1 + eps`, eps uniform in [-amp, amp).
    pub fn jitter(&self, key: &str, amp: f64) -> f64 {
        1.0 + self.uniform_range(key, -amp, amp)
    }

    /// Normal draw via Box–Muller over the sub-keys `key:u1` and `key:u2`.
    pub fn normal(&self, key: &str, mean: f64, sd: f64) -> f64 {
        let u1 = self.uniform(&format!("{key}:u1")).max(BOX_MULLER_EPSILON);
        let u2 = self.uniform(&format!("{key}:u2"));
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + sd * z
    }
}

/// Stable 64-bit seed from text parts joined by `||`.
pub fn stable_seed(parts: &[&str]) -> u64 {
    let digest = Sha256::digest(parts.join("||").as_bytes());
    first_u64(&digest)
}

fn first_u64(digest: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// A named, deterministic RNG stream for one logical key.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    pub fn new(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Seed the stream from text parts (see `stable_seed`).
    pub fn from_parts(parts: &[&str]) -> Self {
        Self::new(stable_seed(parts))
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / MANTISSA_SCALE)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an integer in [lo, hi], both inclusive.
    pub fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        assert!(lo <= hi, "lo must be <= hi");
        lo + self.next_u64_below(u64::from(hi - lo) + 1) as u32
    }
}

impl RngCore for StreamRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}
