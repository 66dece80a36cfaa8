//! # Fitness Evaluation
//!
//! The [`Fitness`] trait maps one genome to a real score; higher is
//! better. Fixed extra parameters of the objective live as fields of the
//! implementing struct, and plain closures over a gene slice work out of
//! the box:
//!
//! ```rust
//! use genoptim::fitness::Fitness;
//! use genoptim::rng::GaRng;
//!
//! struct WeightedOnes {
//!     weights: Vec<f64>,
//! }
//!
//! impl Fitness<genoptim::encoding::Binary> for WeightedOnes {
//!     fn score(&self, genome: &[u8], _rng: &mut GaRng) -> f64 {
//!         genome
//!             .iter()
//!             .zip(&self.weights)
//!             .map(|(&b, w)| b as f64 * w)
//!             .sum()
//!     }
//! }
//! ```
//!
//! The generation evaluator computes scores only for rows whose fitness
//! is not yet known, shares the score of duplicate rows within the
//! generation, and — when a worker pool is present — fans rows out while
//! keeping results in population order. Each evaluation task receives a
//! random substream derived from `(root seed, generation, row index)`,
//! which makes stochastic fitness functions reproduce bit-for-bit at any
//! worker count.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon::ThreadPoolBuilder;

use crate::encoding::{Encoding, Genome};
use crate::error::{GaError, Result};
use crate::rng::GaRng;

/// The outcome of evaluating one genome.
#[derive(Debug, Clone)]
pub struct Evaluation<E: Encoding> {
    /// The fitness score; non-finite values mark the row as missing.
    pub score: f64,
    /// Optional replacement row, adopted only in population-update mode
    /// and only if it satisfies the encoding's domain predicate.
    pub replacement: Option<Genome<E>>,
}

/// Trait for fitness functions. Higher scores are better.
pub trait Fitness<E: Encoding>: Send + Sync {
    /// Scores one genome. `rng` is a reproducible substream; stochastic
    /// objectives should draw from it and nowhere else.
    fn score(&self, genome: &[E::Gene], rng: &mut GaRng) -> f64;

    /// Scores one genome, optionally proposing a replacement row for
    /// population-update mode. The default wraps [`Fitness::score`].
    fn evaluate(&self, genome: &[E::Gene], rng: &mut GaRng) -> Evaluation<E> {
        Evaluation {
            score: self.score(genome, rng),
            replacement: None,
        }
    }
}

/// Adapts a plain function or closure over a gene slice into a
/// [`Fitness`].
///
/// ```rust
/// use genoptim::encoding::Binary;
/// use genoptim::evolution::Ga;
/// use genoptim::fitness::FnFitness;
///
/// let ga = Ga::builder()
///     .encoding(Binary::new(4))
///     .fitness(FnFitness(|g: &[u8]| g.iter().map(|&b| b as f64).sum()))
///     .seed(1)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnFitness<F>(pub F);

impl<E, F> Fitness<E> for FnFitness<F>
where
    E: Encoding,
    F: Fn(&[E::Gene]) -> f64 + Send + Sync,
{
    fn score(&self, genome: &[E::Gene], _rng: &mut GaRng) -> f64 {
        (self.0)(genome)
    }
}

/// Where fitness evaluation runs.
#[derive(Clone, Default)]
pub enum Parallelism {
    /// Serial evaluation on the driver thread.
    #[default]
    Off,
    /// A driver-owned pool with rayon's default thread count, torn down
    /// when the run ends.
    On,
    /// A driver-owned pool with exactly this many workers, torn down when
    /// the run ends.
    Threads(usize),
    /// A caller-owned pool. The driver uses it but never stops it.
    Pool(Arc<rayon::ThreadPool>),
}

impl fmt::Debug for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parallelism::Off => write!(f, "Off"),
            Parallelism::On => write!(f, "On"),
            Parallelism::Threads(n) => write!(f, "Threads({n})"),
            Parallelism::Pool(_) => write!(f, "Pool(..)"),
        }
    }
}

/// A running worker pool. Driver-owned pools stop when the handle drops;
/// shared pools outlive it.
pub(crate) enum PoolHandle {
    Owned(rayon::ThreadPool),
    Shared(Arc<rayon::ThreadPool>),
}

impl PoolHandle {
    pub(crate) fn get(&self) -> &rayon::ThreadPool {
        match self {
            PoolHandle::Owned(pool) => pool,
            PoolHandle::Shared(pool) => pool,
        }
    }
}

/// Starts the pool the configuration asks for, if any.
pub(crate) fn spawn_pool(parallel: &Parallelism) -> Result<Option<PoolHandle>> {
    match parallel {
        Parallelism::Off => Ok(None),
        Parallelism::On => ThreadPoolBuilder::new()
            .build()
            .map(|p| Some(PoolHandle::Owned(p)))
            .map_err(|e| GaError::WorkerPool(e.to_string())),
        Parallelism::Threads(n) => ThreadPoolBuilder::new()
            .num_threads(*n)
            .build()
            .map(|p| Some(PoolHandle::Owned(p)))
            .map_err(|e| GaError::WorkerPool(e.to_string())),
        Parallelism::Pool(pool) => Ok(Some(PoolHandle::Shared(Arc::clone(pool)))),
    }
}

/// Evaluates every row of `population` whose `fitness` entry is missing.
///
/// Non-finite scores are stored as `NaN` (the row simply cannot be
/// selected this generation); a generation left with no finite entry at
/// all aborts with [`GaError::MissingFitness`]. Replacement rows are
/// validated and written back only when `update_pop` is set.
pub(crate) fn evaluate_generation<E: Encoding>(
    encoding: &E,
    population: &mut [Genome<E>],
    fitness: &mut [f64],
    objective: &dyn Fitness<E>,
    generation: usize,
    root_seed: u64,
    update_pop: bool,
    pool: Option<&rayon::ThreadPool>,
) -> Result<()> {
    debug_assert_eq!(population.len(), fitness.len());

    // Group pending rows so duplicates are computed once. Buckets hold
    // genome-equal rows; the hash only narrows the candidate set.
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut by_key: HashMap<u64, Vec<usize>> = HashMap::new();
    for i in 0..population.len() {
        if !fitness[i].is_nan() {
            continue;
        }
        let key = encoding.cache_key(&population[i]);
        let bucket = by_key.entry(key).or_default();
        match bucket
            .iter()
            .find(|&&g| population[groups[g].0] == population[i])
        {
            Some(&g) => groups[g].1.push(i),
            None => {
                bucket.push(groups.len());
                groups.push((i, Vec::new()));
            }
        }
    }

    if groups.is_empty() {
        return finish_generation(fitness, generation);
    }

    let rows: &[Genome<E>] = population;
    let evaluate_one = |&(canonical, _): &(usize, Vec<usize>)| -> Evaluation<E> {
        let mut rng = GaRng::substream(root_seed, generation, canonical);
        objective.evaluate(&rows[canonical], &mut rng)
    };

    let results: Vec<Evaluation<E>> = match pool {
        Some(pool) => pool.install(|| (&groups).into_par_iter().map(evaluate_one).collect()),
        None => groups.iter().map(evaluate_one).collect(),
    };

    for ((canonical, duplicates), evaluation) in groups.iter().zip(results) {
        let score = if evaluation.score.is_finite() {
            evaluation.score
        } else {
            f64::NAN
        };
        fitness[*canonical] = score;
        for &d in duplicates {
            fitness[d] = score;
        }
        if update_pop {
            if let Some(replacement) = evaluation.replacement {
                if !encoding.is_valid(&replacement) {
                    return Err(GaError::OperatorDomainViolation {
                        operator: "fitness population update".to_string(),
                        generation,
                    });
                }
                for &d in duplicates {
                    population[d] = replacement.clone();
                }
                population[*canonical] = replacement;
            }
        }
    }

    finish_generation(fitness, generation)
}

fn finish_generation(fitness: &[f64], generation: usize) -> Result<()> {
    if fitness.iter().any(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(GaError::MissingFitness { generation })
    }
}
