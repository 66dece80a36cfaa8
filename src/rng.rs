//! Random number generation for reproducible searches.
//!
//! Every source of randomness in the crate flows through [`GaRng`], a thin
//! wrapper around a seedable [`StdRng`]. Drivers hold one root stream;
//! fitness evaluation derives an independent substream per
//! `(generation, row)` pair, so results reproduce bit-for-bit regardless
//! of how many workers evaluate the population.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seedable random stream used throughout the optimizer.
#[derive(Debug, Clone)]
pub struct GaRng {
    rng: StdRng,
}

impl GaRng {
    /// Creates a stream seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a stream from a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Derives the substream for one evaluation task.
    ///
    /// The mapping depends only on `(root_seed, generation, index)`, never
    /// on which worker runs the task, which is what makes parallel fitness
    /// evaluation reproducible.
    pub fn substream(root_seed: u64, generation: usize, index: usize) -> Self {
        let mixed = splitmix64(
            root_seed ^ splitmix64((generation as u64) << 32 | index as u64),
        );
        Self::from_seed(mixed)
    }

    /// Derives an independent root seed for a labelled child stream,
    /// e.g. one per island.
    pub(crate) fn derive_seed(root_seed: u64, stream: u64) -> u64 {
        splitmix64(root_seed ^ splitmix64(stream ^ 0xa5a5_5a5a_c01d_beef))
    }

    /// Returns a uniform value in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Returns a uniform value in `[low, high)`.
    pub fn uniform_range(&mut self, low: f64, high: f64) -> f64 {
        if low == high {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Returns a uniform index in `[0, n)`. `n` must be positive.
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Returns a standard-normal draw (Box-Muller).
    pub fn normal(&mut self) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Flips a biased coin with probability `p` of `true`.
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.rng.gen::<f64>() < p
    }

    /// Access to the underlying [`rand::Rng`] for shuffle and friends.
    pub fn inner(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

// SplitMix64 finalizer; cheap, full-period seed mixing.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}
