use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;

use super::{Encoding, EncodingKind, Genome};
use crate::error::{GaError, Result};
use crate::operators::registry::OperatorRegistry;
use crate::operators::{
    crossover::{CycleCrossover, OrderCrossover, PmxCrossover},
    mutation::{InsertionMutation, ScrambleMutation, SwapMutation},
};
use crate::rng::GaRng;

/// Permutation encoding over the contiguous range `lower..=upper`.
///
/// A valid genome contains each integer of the range exactly once.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    lower: i64,
    upper: i64,
}

impl Permutation {
    /// Creates a permutation encoding over `lower..=upper`.
    ///
    /// # Errors
    ///
    /// Returns [`GaError::ShapeMismatch`] if `upper < lower`.
    pub fn new(lower: i64, upper: i64) -> Result<Self> {
        if upper < lower {
            return Err(GaError::ShapeMismatch(format!(
                "permutation range is empty: [{}, {}]",
                lower, upper
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Smallest element of the range.
    pub fn lower(&self) -> i64 {
        self.lower
    }

    /// Largest element of the range.
    pub fn upper(&self) -> i64 {
        self.upper
    }
}

impl Encoding for Permutation {
    type Gene = i64;

    fn kind(&self) -> EncodingKind {
        EncodingKind::Permutation
    }

    fn nvars(&self) -> usize {
        (self.upper - self.lower + 1) as usize
    }

    fn sample(&self, rng: &mut GaRng) -> Genome<Self> {
        let mut genome: Vec<i64> = (self.lower..=self.upper).collect();
        genome.shuffle(rng.inner());
        genome
    }

    fn is_valid(&self, genome: &[i64]) -> bool {
        if genome.len() != self.nvars() {
            return false;
        }
        let mut seen = vec![false; self.nvars()];
        for &g in genome {
            if g < self.lower || g > self.upper {
                return false;
            }
            let slot = (g - self.lower) as usize;
            if seen[slot] {
                return false;
            }
            seen[slot] = true;
        }
        true
    }

    fn cache_key(&self, genome: &[i64]) -> u64 {
        let mut hasher = DefaultHasher::new();
        genome.hash(&mut hasher);
        hasher.finish()
    }

    fn builtin_operators() -> OperatorRegistry<Self> {
        let mut registry = OperatorRegistry::new();
        crate::operators::selection::register_generic(&mut registry);
        registry.register_crossover("order", OrderCrossover::new());
        registry.register_crossover("pmx", PmxCrossover::new());
        registry.register_crossover("cycle", CycleCrossover::new());
        registry.register_mutation("swap", SwapMutation::new());
        registry.register_mutation("insertion", InsertionMutation::new());
        registry.register_mutation("scramble", ScrambleMutation::new());
        registry
    }
}
