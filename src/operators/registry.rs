//! Name-keyed operator registry.
//!
//! Each encoding ships a registry pre-loaded with its built-in operators
//! (see [`Encoding::builtin_operators`]); callers may register custom
//! operators under new names and select them through the process-wide
//! defaults table in [`crate::control`] or per-run overrides.
//!
//! ```rust
//! use genoptim::encoding::{Binary, Encoding};
//! use genoptim::operators::selection::TournamentSelection;
//!
//! let mut registry = Binary::builtin_operators();
//! registry.register_selection("tournament5", TournamentSelection::new(5).unwrap());
//! assert!(registry.selection("tournament5").is_ok());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::encoding::Encoding;
use crate::error::{GaError, Result};
use crate::operators::{Crossover, Mutation, PopulationInit, Selection, UniformInit};

/// Registry of named operators for one encoding.
#[derive(Debug, Clone)]
pub struct OperatorRegistry<E: Encoding> {
    init: HashMap<String, Arc<dyn PopulationInit<E>>>,
    selection: HashMap<String, Arc<dyn Selection<E>>>,
    crossover: HashMap<String, Arc<dyn Crossover<E>>>,
    mutation: HashMap<String, Arc<dyn Mutation<E>>>,
}

impl<E: Encoding> OperatorRegistry<E> {
    /// Creates a registry containing only the uniform initializer.
    pub fn new() -> Self {
        let mut registry = Self {
            init: HashMap::new(),
            selection: HashMap::new(),
            crossover: HashMap::new(),
            mutation: HashMap::new(),
        };
        registry.register_init("uniform", UniformInit::new());
        registry
    }

    /// Registers a population initializer under `name`.
    pub fn register_init<O: PopulationInit<E> + 'static>(&mut self, name: &str, op: O) {
        self.init.insert(name.to_string(), Arc::new(op));
    }

    /// Registers a selection strategy under `name`.
    pub fn register_selection<O: Selection<E> + 'static>(&mut self, name: &str, op: O) {
        self.selection.insert(name.to_string(), Arc::new(op));
    }

    /// Registers a crossover strategy under `name`.
    pub fn register_crossover<O: Crossover<E> + 'static>(&mut self, name: &str, op: O) {
        self.crossover.insert(name.to_string(), Arc::new(op));
    }

    /// Registers a mutation strategy under `name`.
    pub fn register_mutation<O: Mutation<E> + 'static>(&mut self, name: &str, op: O) {
        self.mutation.insert(name.to_string(), Arc::new(op));
    }

    /// Looks up a population initializer.
    pub fn init(&self, name: &str) -> Result<Arc<dyn PopulationInit<E>>> {
        self.init
            .get(name)
            .cloned()
            .ok_or_else(|| unknown("population init", name))
    }

    /// Looks up a selection strategy.
    pub fn selection(&self, name: &str) -> Result<Arc<dyn Selection<E>>> {
        self.selection
            .get(name)
            .cloned()
            .ok_or_else(|| unknown("selection", name))
    }

    /// Looks up a crossover strategy.
    pub fn crossover(&self, name: &str) -> Result<Arc<dyn Crossover<E>>> {
        self.crossover
            .get(name)
            .cloned()
            .ok_or_else(|| unknown("crossover", name))
    }

    /// Looks up a mutation strategy.
    pub fn mutation(&self, name: &str) -> Result<Arc<dyn Mutation<E>>> {
        self.mutation
            .get(name)
            .cloned()
            .ok_or_else(|| unknown("mutation", name))
    }
}

impl<E: Encoding> Default for OperatorRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown(category: &str, name: &str) -> GaError {
    GaError::Configuration(format!("no {category} operator registered as `{name}`"))
}
