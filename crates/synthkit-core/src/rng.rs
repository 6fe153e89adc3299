//! # Seeded Random Stream
//!
//! `Rng` wraps a PCG engine behind the handful of draw operations the
//! generators need, plus `derive`, which forks an independent child stream
//! from a string salt. Child seeds come from SHA-256 so that the same
//! `(seed, salt)` pair always yields the same stream, and drawing from a
//! child never perturbs the parent.
//!
//! The engine is pinned to `Pcg64Mcg` rather than `StdRng` because `StdRng`
//! is allowed to change algorithms between `rand` releases, which would
//! silently break the reproducibility contract. Determinism is guaranteed
//! within this implementation only; sequences are not portable to other
//! PCG-based tools.

use rand::{Rng as _, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal};
use rand_pcg::Pcg64Mcg;
use sha2::{Digest, Sha256};

/// Deterministic random stream with child-stream derivation.
#[derive(Debug, Clone)]
pub struct Rng {
    seed: u64,
    inner: Pcg64Mcg,
}

impl Rng {
    /// Construct a stream reproducible from `seed` alone.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// The seed this stream was constructed from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork an independent child stream salted by `salt`.
    ///
    /// The child seed is the leading 64 bits (big-endian) of
    /// SHA-256("{parent_seed}:{salt}"). Does not consume any draws from
    /// the parent stream.
    pub fn derive(&self, salt: &str) -> Self {
        let digest = Sha256::digest(format!("{}:{}", self.seed, salt).as_bytes());
        let mut leading = [0u8; 8];
        leading.copy_from_slice(&digest[..8]);
        Self::with_seed(u64::from_be_bytes(leading))
    }

    /// Uniform integer in the inclusive range `[a, b]`.
    pub fn rand_int(&mut self, a: i64, b: i64) -> i64 {
        if b <= a {
            return a;
        }
        self.inner.random_range(a..=b)
    }

    /// Uniform float in the half-open range `[a, b)`.
    pub fn uniform(&mut self, a: f64, b: f64) -> f64 {
        if b <= a {
            return a;
        }
        self.inner.random_range(a..b)
    }

    /// Uniform float in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        self.inner.random()
    }

    /// Normally distributed float with mean `mu` and stddev `sigma`.
    pub fn gauss(&mut self, mu: f64, sigma: f64) -> f64 {
        match Normal::new(mu, sigma) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => mu,
        }
    }

    /// Log-normally distributed float with parameters `mu` and `sigma`.
    pub fn lognormal(&mut self, mu: f64, sigma: f64) -> f64 {
        match LogNormal::new(mu, sigma) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => mu.exp(),
        }
    }

    /// Uniform choice over a slice. Returns `None` on an empty slice.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.inner.random_range(0..items.len());
        Some(&items[idx])
    }

    /// Uniform choice over the characters of a string.
    pub fn choice_char(&mut self, alphabet: &str) -> Option<char> {
        let chars: Vec<char> = alphabet.chars().collect();
        self.choice(&chars).copied()
    }

    /// Weighted choice via a cumulative-distribution walk.
    ///
    /// Negative weights are clamped to zero; an all-zero weight list falls
    /// back to a uniform choice.
    pub fn weighted_choice<'a, T>(&mut self, items: &'a [T], weights: &[f64]) -> Option<&'a T> {
        if items.is_empty() || items.len() != weights.len() {
            return self.choice(items);
        }
        let clamped: Vec<f64> = weights.iter().map(|w| w.max(0.0)).collect();
        let total: f64 = clamped.iter().sum();
        if total <= 0.0 {
            return self.choice(items);
        }
        let roll = self.random() * total;
        let mut cumulative = 0.0;
        for (item, w) in items.iter().zip(&clamped) {
            cumulative += w;
            if roll < cumulative {
                return Some(item);
            }
        }
        // Floating-point edge case
        items.last()
    }

    /// 128 uniformly random bits.
    pub fn rand_u128(&mut self) -> u128 {
        self.inner.random()
    }
}
