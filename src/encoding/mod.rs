//! # Encodings
//!
//! An [`Encoding`] describes the representation family of an individual:
//! how many genes it has, how to sample a fresh genome uniformly from the
//! domain, and what it means for a genome to be valid. Three encodings are
//! built in:
//!
//! - [`Binary`]: fixed-length bit strings.
//! - [`RealValued`]: real vectors inside per-variable box bounds.
//! - [`Permutation`]: permutations of a contiguous integer range.
//!
//! The drivers are generic over the encoding, so one generation engine
//! serves all three without boxing individual rows.

mod binary;
mod permutation;
mod real;

pub use binary::Binary;
pub use permutation::Permutation;
pub use real::RealValued;

use std::fmt::Debug;

use crate::error::{GaError, Result};
use crate::operators::OperatorRegistry;
use crate::rng::GaRng;

/// One individual: an ordered sequence of genes.
pub type Genome<E> = Vec<<E as Encoding>::Gene>;

/// Identifies the representation family, for default-operator lookup.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingKind {
    /// Fixed-length bit strings.
    Binary,
    /// Bounded real-valued vectors.
    RealValued,
    /// Permutations of a contiguous integer range.
    Permutation,
}

/// Trait for representation families of individuals.
///
/// Implementors supply the gene type, uniform sampling, the domain
/// predicate used to police operator outputs, and a cache key used to
/// share fitness scores between duplicate rows of one generation.
pub trait Encoding: Clone + Debug + Send + Sync + 'static {
    /// The element type of a genome.
    type Gene: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Which representation family this is.
    fn kind(&self) -> EncodingKind;

    /// Number of genes per individual.
    fn nvars(&self) -> usize;

    /// Samples one genome uniformly from the domain.
    fn sample(&self, rng: &mut GaRng) -> Genome<Self>;

    /// Whether `genome` satisfies the encoding's domain predicate.
    fn is_valid(&self, genome: &[Self::Gene]) -> bool;

    /// A hash of the genome used to detect duplicate rows within one
    /// generation. Equal genomes must map to equal keys.
    fn cache_key(&self, genome: &[Self::Gene]) -> u64;

    /// Registry pre-loaded with this encoding's built-in operators.
    fn builtin_operators() -> OperatorRegistry<Self>
    where
        Self: Sized;

    /// The encoding's built-in projection into a real box, used by hybrid
    /// local search. `None` means the caller must supply one.
    fn builtin_projection() -> Option<std::sync::Arc<dyn crate::local_search::RealProjection<Self>>>
    where
        Self: Sized,
    {
        None
    }
}

/// Marker for encodings whose domain predicate is per-position (bit
/// strings, bounded reals), so exchanging aligned genes between two valid
/// parents cannot leave the domain. Permutations are excluded: point-wise
/// exchange breaks their uniqueness invariant.
pub trait VectorEncoding: Encoding {}

impl VectorEncoding for Binary {}
impl VectorEncoding for RealValued {}

/// Builds the initial population.
///
/// Rows `0..k` (where `k = min(|suggestions|, pop_size)`) come from
/// `suggestions`; remaining rows are sampled uniformly from the domain.
pub(crate) fn seeded_population<E: Encoding>(
    encoding: &E,
    pop_size: usize,
    suggestions: &[Genome<E>],
    rng: &mut GaRng,
) -> Result<Vec<Genome<E>>> {
    if pop_size == 0 {
        return Err(GaError::EmptyPopulation);
    }
    let mut rows = Vec::with_capacity(pop_size);
    for (i, suggestion) in suggestions.iter().take(pop_size).enumerate() {
        if suggestion.len() != encoding.nvars() {
            return Err(GaError::ShapeMismatch(format!(
                "suggestion row {} has {} columns, encoding declares {}",
                i,
                suggestion.len(),
                encoding.nvars()
            )));
        }
        if !encoding.is_valid(suggestion) {
            return Err(GaError::ShapeMismatch(format!(
                "suggestion row {} is outside the encoding's domain",
                i
            )));
        }
        rows.push(suggestion.clone());
    }
    while rows.len() < pop_size {
        rows.push(encoding.sample(rng));
    }
    Ok(rows)
}
