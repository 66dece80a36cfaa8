//! # Genetic Operators
//!
//! The four operator categories of the search — population initialization,
//! selection, crossover, and mutation — are traits generic over the
//! [`Encoding`]. Drivers hold one operator object per category for the
//! run, resolved either from a caller override or from the encoding's
//! default names (see [`crate::control`]).
//!
//! All operators are seeded-stochastic functions: they draw randomness
//! only from the [`GaRng`] they are handed, which is what keeps whole
//! runs reproducible under a fixed seed.

pub mod crossover;
pub mod mutation;
pub mod registry;
pub mod selection;

pub use registry::OperatorRegistry;

use std::fmt::Debug;
use std::sync::Arc;

use crate::encoding::{Encoding, Genome};
use crate::error::Result;
use crate::rng::GaRng;

/// Builds the initial population.
pub trait PopulationInit<E: Encoding>: Debug + Send + Sync {
    /// Returns `pop_size` genomes. Rows `0..min(|suggestions|, pop_size)`
    /// must come from `suggestions`; the remainder is sampled uniformly.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GaError::ShapeMismatch`] when a suggestion
    /// row does not fit the encoding.
    fn init(
        &self,
        encoding: &E,
        pop_size: usize,
        suggestions: &[Genome<E>],
        rng: &mut GaRng,
    ) -> Result<Vec<Genome<E>>>;
}

/// The default initializer: suggestion rows first, uniform samples after.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformInit;

impl UniformInit {
    pub fn new() -> Self {
        Self
    }
}

impl<E: Encoding> PopulationInit<E> for UniformInit {
    fn init(
        &self,
        encoding: &E,
        pop_size: usize,
        suggestions: &[Genome<E>],
        rng: &mut GaRng,
    ) -> Result<Vec<Genome<E>>> {
        crate::encoding::seeded_population(encoding, pop_size, suggestions, rng)
    }
}

/// Parents chosen by a [`Selection`] operator, with their fitness carried
/// along so unchanged individuals are not re-evaluated.
#[derive(Debug, Clone)]
pub struct SelectionOutcome<E: Encoding> {
    /// The parent pool, one entry per population slot.
    pub parents: Vec<Genome<E>>,
    /// Fitness of each parent, aligned by index.
    pub fitness: Vec<f64>,
}

/// Chooses the parent pool for the next generation.
pub trait Selection<E: Encoding>: Debug + Send + Sync {
    /// Selects `population.len()` parents.
    ///
    /// Individuals whose fitness entry is missing (`NaN`) must never be
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the population is empty, the fitness vector is
    /// misaligned, or no individual has a finite fitness.
    fn select(
        &self,
        population: &[Genome<E>],
        fitness: &[f64],
        rng: &mut GaRng,
    ) -> Result<SelectionOutcome<E>>;
}

/// Combines two parents into two children.
pub trait Crossover<E: Encoding>: Debug + Send + Sync {
    /// Produces two children from `a` and `b`. Children must satisfy the
    /// encoding's domain predicate.
    fn cross(
        &self,
        encoding: &E,
        a: &[E::Gene],
        b: &[E::Gene],
        rng: &mut GaRng,
    ) -> Result<(Genome<E>, Genome<E>)>;
}

/// Perturbs one genome in place.
pub trait Mutation<E: Encoding>: Debug + Send + Sync {
    /// Mutates `genome`, preserving the domain predicate.
    fn mutate(&self, encoding: &E, genome: &mut Genome<E>, rng: &mut GaRng) -> Result<()>;
}

/// The resolved operator objects a driver uses for one run.
#[derive(Debug, Clone)]
pub struct OperatorSet<E: Encoding> {
    /// Population initializer.
    pub init: Arc<dyn PopulationInit<E>>,
    /// Parent selection.
    pub selection: Arc<dyn Selection<E>>,
    /// Pairwise crossover.
    pub crossover: Arc<dyn Crossover<E>>,
    /// Per-individual mutation.
    pub mutation: Arc<dyn Mutation<E>>,
}

/// Resolves the operator set an encoding gets by default, looking the
/// names of `table` up in the encoding's builtin registry.
pub fn resolve_default_operators<E: Encoding>(
    encoding: &E,
    table: &crate::control::ControlTable,
) -> Result<OperatorSet<E>> {
    let registry = E::builtin_operators();
    let names = table.for_kind(encoding.kind());
    Ok(OperatorSet {
        init: registry.init(&names.init)?,
        selection: registry.selection(&names.selection)?,
        crossover: registry.crossover(&names.crossover)?,
        mutation: registry.mutation(&names.mutation)?,
    })
}
