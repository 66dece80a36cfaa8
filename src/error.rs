//! # Error Types
//!
//! This module defines the error surface of the optimizer. Configuration
//! problems are reported synchronously before any search state is created;
//! contract violations during the generation loop abort the run with a
//! diagnostic naming the offending operator and generation.
//!
//! ## Examples
//!
//! ```rust
//! use genoptim::error::{GaError, Result};
//!
//! fn check_probability(p: f64) -> Result<()> {
//!     if !(0.0..=1.0).contains(&p) {
//!         return Err(GaError::InvalidParameter(format!(
//!             "crossover probability must be in [0, 1], got {p}"
//!         )));
//!     }
//!     Ok(())
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Represents errors that can occur while configuring or running a search.
#[derive(Error, Debug)]
pub enum GaError {
    /// Suggestions, bounds, or variable names are inconsistent with the
    /// declared encoding.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A numeric parameter is outside its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Every row of a generation evaluated to a non-finite fitness.
    #[error("Missing fitness: no finite fitness value in generation {generation}")]
    MissingFitness {
        /// The generation whose evaluation produced no finite score.
        generation: usize,
    },

    /// An operator, hook, or population update produced a row outside the
    /// encoding's domain.
    #[error("Operator domain violation: `{operator}` produced an invalid row in generation {generation}")]
    OperatorDomainViolation {
        /// Name of the offending operator or hook.
        operator: String,
        /// The generation in which the violation occurred.
        generation: usize,
    },

    /// An invalid component combination was detected before the loop.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error that occurs when an empty population is encountered.
    #[error("Empty population error: cannot operate on an empty population")]
    EmptyPopulation,

    /// A worker pool could not be started or a worker failed.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized `Result` type for optimizer operations.
pub type Result<T> = std::result::Result<T, GaError>;

/// Extension trait for `Result` to add context to foreign errors.
///
/// ## Examples
///
/// ```rust
/// use genoptim::error::ResultExt;
///
/// fn parse(input: &str) -> genoptim::error::Result<u64> {
///     input.parse::<u64>().context("failed to parse seed")
/// }
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error to a [`GaError::Other`] carrying `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| GaError::Other(format!("{}: {}", context, e)))
    }
}
