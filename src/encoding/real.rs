use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{Encoding, EncodingKind, Genome};
use crate::error::{GaError, Result};
use crate::operators::registry::OperatorRegistry;
use crate::operators::{
    crossover::{ArithmeticCrossover, BlendCrossover, SinglePointCrossover, UniformCrossover},
    mutation::{GaussianMutation, UniformMutation},
};
use crate::rng::GaRng;

/// Bounded real-vector encoding. Gene `i` lives in `[lower[i], upper[i]]`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RealValued {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl RealValued {
    /// Creates a real-vector encoding with per-variable box bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GaError::ShapeMismatch`] if the bound vectors are empty,
    /// differ in length, or contain a pair with `lower > upper` or a
    /// non-finite endpoint.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.is_empty() || lower.len() != upper.len() {
            return Err(GaError::ShapeMismatch(format!(
                "bound vectors must be non-empty and equal length (lower: {}, upper: {})",
                lower.len(),
                upper.len()
            )));
        }
        for (i, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(GaError::ShapeMismatch(format!(
                    "invalid bounds for variable {}: [{}, {}]",
                    i, lo, hi
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Lower bounds, one per variable.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds, one per variable.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Clamps `x` into the box, component-wise.
    pub fn clamp(&self, x: &mut [f64]) {
        for (v, (lo, hi)) in x.iter_mut().zip(self.lower.iter().zip(&self.upper)) {
            *v = v.clamp(*lo, *hi);
        }
    }
}

impl Encoding for RealValued {
    type Gene = f64;

    fn kind(&self) -> EncodingKind {
        EncodingKind::RealValued
    }

    fn nvars(&self) -> usize {
        self.lower.len()
    }

    fn sample(&self, rng: &mut GaRng) -> Genome<Self> {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(lo, hi)| rng.uniform_range(*lo, *hi))
            .collect()
    }

    fn is_valid(&self, genome: &[f64]) -> bool {
        genome.len() == self.nvars()
            && genome
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(v, (lo, hi))| v.is_finite() && *v >= *lo && *v <= *hi)
    }

    fn cache_key(&self, genome: &[f64]) -> u64 {
        let mut hasher = DefaultHasher::new();
        for v in genome {
            v.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    fn builtin_operators() -> OperatorRegistry<Self> {
        let mut registry = OperatorRegistry::new();
        crate::operators::selection::register_generic(&mut registry);
        registry.register_crossover("single_point", SinglePointCrossover::new());
        registry.register_crossover("uniform", UniformCrossover::new());
        registry.register_crossover("blend", BlendCrossover::default());
        registry.register_crossover("arithmetic", ArithmeticCrossover::new());
        registry.register_mutation("uniform", UniformMutation::new());
        registry.register_mutation("gaussian", GaussianMutation::default());
        registry
    }

    fn builtin_projection(
    ) -> Option<std::sync::Arc<dyn crate::local_search::RealProjection<Self>>> {
        Some(std::sync::Arc::new(
            crate::local_search::IdentityProjection,
        ))
    }
}
