//! Mutation strategies.
//!
//! Each operator perturbs one individual in place and never leaves the
//! encoding's domain. The generation engine decides *whether* an
//! individual mutates (probability `pmutation`); the operator decides
//! *how*.

use rand::seq::SliceRandom;

use crate::encoding::{Binary, Genome, Permutation, RealValued};
use crate::error::{GaError, Result};
use crate::operators::Mutation;
use crate::rng::GaRng;

/// Flips one uniformly chosen bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitFlipMutation;

impl BitFlipMutation {
    pub fn new() -> Self {
        Self
    }
}

impl Mutation<Binary> for BitFlipMutation {
    fn mutate(&self, _encoding: &Binary, genome: &mut Genome<Binary>, rng: &mut GaRng) -> Result<()> {
        if genome.is_empty() {
            return Ok(());
        }
        let i = rng.index(genome.len());
        genome[i] ^= 1;
        Ok(())
    }
}

/// Resamples one uniformly chosen gene from its variable's range.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformMutation;

impl UniformMutation {
    pub fn new() -> Self {
        Self
    }
}

impl Mutation<RealValued> for UniformMutation {
    fn mutate(
        &self,
        encoding: &RealValued,
        genome: &mut Genome<RealValued>,
        rng: &mut GaRng,
    ) -> Result<()> {
        if genome.is_empty() {
            return Ok(());
        }
        let i = rng.index(genome.len());
        genome[i] = rng.uniform_range(encoding.lower()[i], encoding.upper()[i]);
        Ok(())
    }
}

/// Adds a Gaussian step to one gene and clips it back into the box.
///
/// The step's standard deviation is `sd_fraction` of the variable's
/// range, so the operator scales with the domain.
#[derive(Debug, Clone, Copy)]
pub struct GaussianMutation {
    sd_fraction: f64,
}

impl GaussianMutation {
    /// Creates the operator with the given relative standard deviation.
    ///
    /// # Errors
    ///
    /// Returns [`GaError::InvalidParameter`] unless `sd_fraction` is
    /// positive and finite.
    pub fn new(sd_fraction: f64) -> Result<Self> {
        if !(sd_fraction.is_finite() && sd_fraction > 0.0) {
            return Err(GaError::InvalidParameter(format!(
                "gaussian mutation sd fraction must be positive, got {sd_fraction}"
            )));
        }
        Ok(Self { sd_fraction })
    }
}

impl Default for GaussianMutation {
    fn default() -> Self {
        Self { sd_fraction: 0.1 }
    }
}

impl Mutation<RealValued> for GaussianMutation {
    fn mutate(
        &self,
        encoding: &RealValued,
        genome: &mut Genome<RealValued>,
        rng: &mut GaRng,
    ) -> Result<()> {
        if genome.is_empty() {
            return Ok(());
        }
        let i = rng.index(genome.len());
        let (lo, hi) = (encoding.lower()[i], encoding.upper()[i]);
        let sd = self.sd_fraction * (hi - lo);
        genome[i] = (genome[i] + sd * rng.normal()).clamp(lo, hi);
        Ok(())
    }
}

/// Swaps two distinct positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapMutation;

impl SwapMutation {
    pub fn new() -> Self {
        Self
    }
}

impl Mutation<Permutation> for SwapMutation {
    fn mutate(
        &self,
        _encoding: &Permutation,
        genome: &mut Genome<Permutation>,
        rng: &mut GaRng,
    ) -> Result<()> {
        if genome.len() < 2 {
            return Ok(());
        }
        let i = rng.index(genome.len());
        let mut j = rng.index(genome.len() - 1);
        if j >= i {
            j += 1;
        }
        genome.swap(i, j);
        Ok(())
    }
}

/// Removes one element and re-inserts it at another position, shifting
/// the genes in between.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionMutation;

impl InsertionMutation {
    pub fn new() -> Self {
        Self
    }
}

impl Mutation<Permutation> for InsertionMutation {
    fn mutate(
        &self,
        _encoding: &Permutation,
        genome: &mut Genome<Permutation>,
        rng: &mut GaRng,
    ) -> Result<()> {
        if genome.len() < 2 {
            return Ok(());
        }
        let from = rng.index(genome.len());
        let to = rng.index(genome.len());
        let gene = genome.remove(from);
        genome.insert(to, gene);
        Ok(())
    }
}

/// Shuffles a random contiguous slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrambleMutation;

impl ScrambleMutation {
    pub fn new() -> Self {
        Self
    }
}

impl Mutation<Permutation> for ScrambleMutation {
    fn mutate(
        &self,
        _encoding: &Permutation,
        genome: &mut Genome<Permutation>,
        rng: &mut GaRng,
    ) -> Result<()> {
        if genome.len() < 2 {
            return Ok(());
        }
        let i = rng.index(genome.len());
        let j = rng.index(genome.len());
        let (start, end) = if i <= j { (i, j + 1) } else { (j, i + 1) };
        genome[start..end].shuffle(rng.inner());
        Ok(())
    }
}
