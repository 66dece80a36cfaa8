//! # Hybrid Local Search
//!
//! With probability `poptim` per generation, the driver picks one
//! individual — biased toward fitter rows by the selection pressure
//! `pressel` — and hands it to a general-purpose box-bounded minimizer
//! running on the negated fitness. The individual and its fitness are
//! replaced only on strict improvement.
//!
//! Real-valued genomes project into the optimizer's search space
//! directly. Binary and permutation genomes have no built-in projection;
//! supply a [`RealProjection`] or the driver skips refinement with a
//! one-time warning.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::encoding::{Encoding, Genome, RealValued};
use crate::error::{GaError, Result};
use crate::fitness::Fitness;
use crate::rng::GaRng;

/// Tuning knobs for the hybrid step.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct LocalSearchOptions {
    /// Probability of running local search in a generation.
    pub poptim: f64,
    /// Selection pressure of the starting-point distribution; `0.5` is
    /// near-uniform, values toward `1` concentrate on the best rows.
    pub pressel: f64,
    /// Inner-iteration budget of the optimizer.
    pub maxit: usize,
}

impl Default for LocalSearchOptions {
    fn default() -> Self {
        Self {
            poptim: 0.05,
            pressel: 0.5,
            maxit: 100,
        }
    }
}

impl LocalSearchOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.poptim) {
            return Err(GaError::InvalidParameter(format!(
                "poptim must be in [0, 1], got {}",
                self.poptim
            )));
        }
        if !(0.0..=1.0).contains(&self.pressel) {
            return Err(GaError::InvalidParameter(format!(
                "pressel must be in [0, 1], got {}",
                self.pressel
            )));
        }
        if self.maxit == 0 {
            return Err(GaError::InvalidParameter(
                "local search maxit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A general-purpose minimizer over a box-bounded real vector.
pub trait LocalOptimizer: Debug + Send + Sync {
    /// Minimizes `objective` inside `[lower, upper]`, starting from
    /// `start`, for up to `maxit` iterations. Returns the best point and
    /// its objective value.
    fn minimize(
        &self,
        objective: &mut dyn FnMut(&[f64]) -> f64,
        start: &[f64],
        lower: &[f64],
        upper: &[f64],
        maxit: usize,
    ) -> (Vec<f64>, f64);
}

/// Maps genomes into the optimizer's real search space and back.
pub trait RealProjection<E: Encoding>: Debug + Send + Sync {
    /// Box bounds of the projected space.
    fn bounds(&self, encoding: &E) -> (Vec<f64>, Vec<f64>);

    /// Projects a genome to a real vector.
    fn to_reals(&self, encoding: &E, genome: &[E::Gene]) -> Vec<f64>;

    /// Recovers a domain-valid genome from a real vector.
    fn from_reals(&self, encoding: &E, x: &[f64]) -> Genome<E>;
}

/// The identity projection for real-valued genomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl RealProjection<RealValued> for IdentityProjection {
    fn bounds(&self, encoding: &RealValued) -> (Vec<f64>, Vec<f64>) {
        (encoding.lower().to_vec(), encoding.upper().to_vec())
    }

    fn to_reals(&self, _encoding: &RealValued, genome: &[f64]) -> Vec<f64> {
        genome.to_vec()
    }

    fn from_reals(&self, encoding: &RealValued, x: &[f64]) -> Genome<RealValued> {
        let mut genome = x.to_vec();
        encoding.clamp(&mut genome);
        genome
    }
}

/// Derivative-free Nelder-Mead simplex search with box clamping.
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    reflection: f64,
    expansion: f64,
    contraction: f64,
    shrink: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

impl NelderMead {
    fn clamped(x: Vec<f64>, lower: &[f64], upper: &[f64]) -> Vec<f64> {
        x.into_iter()
            .zip(lower.iter().zip(upper))
            .map(|(v, (lo, hi))| v.clamp(*lo, *hi))
            .collect()
    }
}

impl LocalOptimizer for NelderMead {
    fn minimize(
        &self,
        objective: &mut dyn FnMut(&[f64]) -> f64,
        start: &[f64],
        lower: &[f64],
        upper: &[f64],
        maxit: usize,
    ) -> (Vec<f64>, f64) {
        let n = start.len();
        if n == 0 {
            return (Vec::new(), objective(start));
        }

        // Initial simplex: the start plus one vertex stepped along each
        // axis by a tenth of that variable's range.
        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(Self::clamped(start.to_vec(), lower, upper));
        for i in 0..n {
            let mut vertex = start.to_vec();
            let span = upper[i] - lower[i];
            let step = if span > 0.0 { 0.1 * span } else { 0.1 };
            vertex[i] = if vertex[i] + step <= upper[i] {
                vertex[i] + step
            } else {
                vertex[i] - step
            };
            simplex.push(Self::clamped(vertex, lower, upper));
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

        for _ in 0..maxit {
            let mut order: Vec<usize> = (0..simplex.len()).collect();
            order.sort_by(|&a, &b| {
                values[a]
                    .partial_cmp(&values[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            let worst = simplex.len() - 1;
            let mut centroid = vec![0.0; n];
            for vertex in &simplex[..worst] {
                for (c, v) in centroid.iter_mut().zip(vertex) {
                    *c += v / worst as f64;
                }
            }

            let reflected = Self::clamped(
                centroid
                    .iter()
                    .zip(&simplex[worst])
                    .map(|(c, w)| c + self.reflection * (c - w))
                    .collect(),
                lower,
                upper,
            );
            let f_reflected = objective(&reflected);

            if f_reflected < values[0] {
                let expanded = Self::clamped(
                    centroid
                        .iter()
                        .zip(&reflected)
                        .map(|(c, r)| c + self.expansion * (r - c))
                        .collect(),
                    lower,
                    upper,
                );
                let f_expanded = objective(&expanded);
                if f_expanded < f_reflected {
                    simplex[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = f_reflected;
                }
            } else if f_reflected < values[worst - 1] {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            } else {
                let contracted = Self::clamped(
                    centroid
                        .iter()
                        .zip(&simplex[worst])
                        .map(|(c, w)| c + self.contraction * (w - c))
                        .collect(),
                    lower,
                    upper,
                );
                let f_contracted = objective(&contracted);
                if f_contracted < values[worst] {
                    simplex[worst] = contracted;
                    values[worst] = f_contracted;
                } else {
                    let best = simplex[0].clone();
                    for vertex in simplex.iter_mut().skip(1) {
                        for (v, b) in vertex.iter_mut().zip(&best) {
                            *v = b + self.shrink * (*v - b);
                        }
                        *vertex = Self::clamped(std::mem::take(vertex), lower, upper);
                    }
                    for i in 1..simplex.len() {
                        values[i] = objective(&simplex[i]);
                    }
                }
            }
        }

        let mut best = 0;
        for i in 1..values.len() {
            if values[i] < values[best] {
                best = i;
            }
        }
        (simplex[best].clone(), values[best])
    }
}

/// Samples one population index with rank-based weights
/// `w ∝ 2·pressel + 2·(1 − 2·pressel)·(r − 1)/(N − 1)` where rank 1 is
/// the best selectable row. Returns `None` when nothing is selectable.
pub(crate) fn rank_weighted_pick(
    fitness: &[f64],
    pressel: f64,
    rng: &mut GaRng,
) -> Option<usize> {
    let mut valid: Vec<usize> = (0..fitness.len())
        .filter(|&i| fitness[i].is_finite())
        .collect();
    if valid.is_empty() {
        return None;
    }
    // Best first, so the slot position equals rank - 1.
    valid.sort_by(|&a, &b| {
        fitness[b]
            .partial_cmp(&fitness[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let n = valid.len() as f64;
    let weights: Vec<f64> = (0..valid.len())
        .map(|slot| {
            if valid.len() == 1 {
                1.0
            } else {
                2.0 * pressel + 2.0 * (1.0 - 2.0 * pressel) * slot as f64 / (n - 1.0)
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();
    let mut u = rng.uniform() * total;
    for (slot, w) in weights.iter().enumerate() {
        u -= w;
        if u <= 0.0 {
            return Some(valid[slot]);
        }
    }
    valid.last().copied()
}

/// The driver-side hybridization adapter.
pub(crate) struct Hybridizer<E: Encoding> {
    pub(crate) options: LocalSearchOptions,
    pub(crate) optimizer: Arc<dyn LocalOptimizer>,
    pub(crate) projection: Option<Arc<dyn RealProjection<E>>>,
    warned: AtomicBool,
}

impl<E: Encoding> Hybridizer<E> {
    pub(crate) fn new(
        options: LocalSearchOptions,
        optimizer: Arc<dyn LocalOptimizer>,
        projection: Option<Arc<dyn RealProjection<E>>>,
    ) -> Self {
        Self {
            options,
            optimizer,
            projection,
            warned: AtomicBool::new(false),
        }
    }

    /// Runs the hybrid step for one generation. Fitness must be fully
    /// evaluated when this is called.
    pub(crate) fn maybe_refine(
        &self,
        encoding: &E,
        population: &mut [Genome<E>],
        fitness: &mut [f64],
        objective: &dyn Fitness<E>,
        generation: usize,
        root_seed: u64,
        rng: &mut GaRng,
    ) -> Result<()> {
        if !rng.chance(self.options.poptim) {
            return Ok(());
        }
        let projection = match &self.projection {
            Some(projection) => projection,
            None => {
                if !self.warned.swap(true, Ordering::Relaxed) {
                    warn!(
                        "local search skipped: encoding has no projection into a real box; \
                         supply one to enable hybridization"
                    );
                }
                return Ok(());
            }
        };
        let target = match rank_weighted_pick(fitness, self.options.pressel, rng) {
            Some(i) => i,
            None => return Ok(()),
        };

        let (lower, upper) = projection.bounds(encoding);
        let start = projection.to_reals(encoding, &population[target]);
        let mut inner_rng = GaRng::substream(root_seed, generation, u32::MAX as usize);
        let mut negated = |x: &[f64]| {
            let genome = projection.from_reals(encoding, x);
            -objective.score(&genome, &mut inner_rng)
        };
        let (best_x, best_neg) = self.optimizer.minimize(
            &mut negated,
            &start,
            &lower,
            &upper,
            self.options.maxit,
        );

        let refined = projection.from_reals(encoding, &best_x);
        if !encoding.is_valid(&refined) {
            return Err(GaError::OperatorDomainViolation {
                operator: "local search".to_string(),
                generation,
            });
        }
        let refined_fitness = -best_neg;
        if refined_fitness.is_finite() && refined_fitness > fitness[target] {
            population[target] = refined;
            fitness[target] = refined_fitness;
        }
        Ok(())
    }
}
