use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{Encoding, EncodingKind, Genome};
use crate::operators::registry::OperatorRegistry;
use crate::operators::{
    crossover::{SinglePointCrossover, UniformCrossover},
    mutation::BitFlipMutation,
};
use crate::rng::GaRng;

/// Fixed-length bit-string encoding. Genes are `0` or `1`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    n_bits: usize,
}

impl Binary {
    /// Creates a bit-string encoding of `n_bits` genes.
    pub fn new(n_bits: usize) -> Self {
        Self { n_bits }
    }

    /// Number of bits per individual.
    pub fn n_bits(&self) -> usize {
        self.n_bits
    }
}

impl Encoding for Binary {
    type Gene = u8;

    fn kind(&self) -> EncodingKind {
        EncodingKind::Binary
    }

    fn nvars(&self) -> usize {
        self.n_bits
    }

    fn sample(&self, rng: &mut GaRng) -> Genome<Self> {
        (0..self.n_bits)
            .map(|_| if rng.chance(0.5) { 1 } else { 0 })
            .collect()
    }

    fn is_valid(&self, genome: &[u8]) -> bool {
        genome.len() == self.n_bits && genome.iter().all(|&b| b <= 1)
    }

    fn cache_key(&self, genome: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        genome.hash(&mut hasher);
        hasher.finish()
    }

    fn builtin_operators() -> OperatorRegistry<Self> {
        let mut registry = OperatorRegistry::new();
        crate::operators::selection::register_generic(&mut registry);
        registry.register_crossover("single_point", SinglePointCrossover::new());
        registry.register_crossover("uniform", UniformCrossover::new());
        registry.register_mutation("bit_flip", BitFlipMutation::new());
        registry
    }
}
