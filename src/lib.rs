//! # genoptim
//!
//! A general-purpose genetic-algorithm optimizer. It maximizes a
//! user-supplied fitness function over three decision-variable
//! encodings — fixed-length bit strings, bounded real vectors, and
//! permutations of an integer range — with two search drivers:
//!
//! - a **panmictic GA** ([`Ga`]): one evolving population with pluggable
//!   selection, crossover, and mutation, elitism, optional hybrid local
//!   search, and optional parallel fitness evaluation;
//! - an **island GA** ([`IslandGa`]): several independently evolving
//!   islands with periodic ring migration of their best individuals.
//!
//! ## A first run
//!
//! ```rust
//! use genoptim::encoding::RealValued;
//! use genoptim::evolution::Ga;
//! use genoptim::fitness::FnFitness;
//!
//! // Maximize -(x² + y²) over [-1, 1]².
//! let result = Ga::builder()
//!     .encoding(RealValued::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap())
//!     .fitness(FnFitness(|x: &[f64]| -(x[0] * x[0] + x[1] * x[1])))
//!     .seed(42)
//!     .maxiter(120)
//!     .build()
//!     .unwrap()
//!     .run()
//!     .unwrap();
//!
//! assert!(result.fitness_value > -0.05);
//! ```
//!
//! ## Key properties
//!
//! - **Reproducible**: a fixed seed makes the whole run, including
//!   parallel fitness evaluation at any worker count, bit-identical.
//!   Evaluation tasks draw randomness from substreams derived from
//!   `(seed, generation, row)`, never from worker scheduling.
//! - **Invariant-checked**: operator and hook outputs are validated
//!   against the encoding's domain predicate every generation; a
//!   violation aborts with the operator's name and the generation.
//! - **Hybridizable**: with `optim(true)` a box-bounded Nelder-Mead
//!   refines one rank-selected individual per generation with
//!   probability `poptim` (see [`local_search`]).
//!
//! ## Modules
//!
//! - [`encoding`]: the three representation families
//! - [`operators`]: selection, crossover, mutation, and the registry
//! - [`fitness`]: the fitness trait and evaluation machinery
//! - [`evolution`]: options, state, and the two drivers
//! - [`local_search`]: the hybrid refinement adapter
//! - [`control`]: process-wide operator defaults
//! - [`error`]: the error surface
//! - [`rng`]: seedable random streams

pub mod control;
pub mod encoding;
pub mod error;
pub mod evolution;
pub mod fitness;
pub mod local_search;
pub mod operators;
pub mod rng;

pub use encoding::{Binary, Encoding, EncodingKind, Genome, Permutation, RealValued};
pub use error::{GaError, Result, ResultExt};
pub use evolution::{
    Ga, GaBuilder, GaOptions, GaResult, GenerationSummary, IslandGa, IslandGaResult,
    IslandOptions, IslandReport, SearchState,
};
pub use fitness::{Evaluation, Fitness, FnFitness, Parallelism};
pub use local_search::{LocalOptimizer, LocalSearchOptions, NelderMead, RealProjection};
pub use operators::{
    Crossover, Mutation, OperatorRegistry, OperatorSet, PopulationInit, Selection,
};
pub use rng::GaRng;
