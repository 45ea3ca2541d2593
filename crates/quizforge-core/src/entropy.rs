//! Multi-source pseudo-randomness for question shuffling.
//!
//! The mixer averages a wall-clock fraction, a monotonic-clock fraction and,
//! when the OS can supply it, a hardware-backed random value. It only exists
//! to make rapid repeated shuffles less predictable and must not be used for
//! anything security sensitive.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};

/// A source of floats in `[0, 1)`.
///
/// The sampler draws every swap index through this trait so tests can
/// substitute a seeded source.
pub trait RandomSource: Send {
    /// Next value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform-ish index in `0..upper`. `upper` must be non-zero.
    fn next_index(&mut self, upper: usize) -> usize {
        debug_assert!(upper > 0, "next_index requires a non-empty range");
        let scaled = (self.next_f64() * upper as f64).floor() as usize;
        scaled.min(upper.saturating_sub(1))
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Averages time- and jitter-derived entropy sources.
#[derive(Debug)]
pub struct EntropyMixer {
    origin: Instant,
    os_available: bool,
}

impl EntropyMixer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            os_available: true,
        }
    }

    /// A mixer that never consults the OS source (time-only entropy).
    pub fn time_only() -> Self {
        Self {
            origin: Instant::now(),
            os_available: false,
        }
    }

    fn timestamp_fraction() -> f64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => f64::from(d.subsec_nanos()) / 1_000_000_000.0,
            Err(_) => 0.0,
        }
    }

    fn monotonic_fraction(&self) -> f64 {
        let nanos = self.origin.elapsed().as_nanos();
        (nanos % 1_000_000) as f64 / 1_000_000.0
    }

    fn os_fraction(&mut self) -> Option<f64> {
        if !self.os_available {
            return None;
        }
        let mut buf = [0u8; 8];
        match OsRng.try_fill_bytes(&mut buf) {
            Ok(()) => Some(unit_from_bits(u64::from_le_bytes(buf))),
            Err(e) => {
                tracing::debug!("OS random source unavailable, using time-only entropy: {e}");
                self.os_available = false;
                None
            }
        }
    }
}

impl Default for EntropyMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyMixer {
    fn next_f64(&mut self) -> f64 {
        let mut sum = Self::timestamp_fraction() + self.monotonic_fraction();
        let mut count = 2.0;
        if let Some(os) = self.os_fraction() {
            sum += os;
            count += 1.0;
        }
        // Each input is in [0, 1), so the mean is too.
        sum / count
    }
}

/// Map the top 53 bits of a `u64` onto `[0, 1)`.
fn unit_from_bits(bits: u64) -> f64 {
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

/// The production source: the entropy mixer folded together with a local
/// PRNG so that neither source alone decides a swap.
#[derive(Debug)]
pub struct MixedSource {
    mixer: EntropyMixer,
    local: StdRng,
}

impl MixedSource {
    pub fn new() -> Self {
        Self {
            mixer: EntropyMixer::new(),
            local: StdRng::from_entropy(),
        }
    }
}

impl Default for MixedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for MixedSource {
    fn next_f64(&mut self) -> f64 {
        let local: f64 = self.local.gen();
        (self.mixer.next_f64() + local).fract()
    }
}

/// Deterministic source for tests and reproducible `--seed` runs.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen()
    }
}

/// Pick the seeded source when a seed is given, the mixed source otherwise.
pub fn source_for(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededSource::new(seed)),
        None => Box::new(MixedSource::new()),
    }
}
