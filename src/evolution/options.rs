//! # Run Options
//!
//! [`GaOptions`] carries the plain-data parameters of a panmictic run;
//! [`IslandOptions`] adds the island-model knobs. Both validate at
//! `build()` time, so configuration errors surface before any search
//! state exists.

use tracing::warn;

use crate::error::{GaError, Result};
use crate::fitness::Parallelism;

/// Parameters of a panmictic run.
#[derive(Debug, Clone)]
pub struct GaOptions {
    /// Population size.
    pub pop_size: usize,
    /// Probability that a parent pair is recombined.
    pub pcrossover: f64,
    /// Probability that an individual mutates.
    pub pmutation: f64,
    /// How many top individuals survive verbatim into the next
    /// generation.
    pub elitism: usize,
    /// Hard ceiling on the number of generations. Zero is the degenerate
    /// run: the initial population is returned untouched.
    pub maxiter: usize,
    /// Stop after this many consecutive generations without improvement.
    pub run: usize,
    /// Stop once the best fitness reaches this value.
    pub max_fitness: f64,
    /// Snapshot the per-generation best rows into the result.
    pub keep_best: bool,
    /// Let the fitness function replace evaluated rows.
    pub update_pop: bool,
    /// Root seed; `None` draws one from entropy.
    pub seed: Option<u64>,
    /// Where fitness evaluation runs.
    pub parallel: Parallelism,
    /// Decision-variable names, for presentation layers. Empty or one
    /// per variable.
    pub names: Vec<String>,
}

/// The default elitism: 5% of the population, at least one.
pub fn default_elitism(pop_size: usize) -> usize {
    ((pop_size as f64 * 0.05).round() as usize).max(1)
}

impl Default for GaOptions {
    fn default() -> Self {
        Self {
            pop_size: 50,
            pcrossover: 0.8,
            pmutation: 0.1,
            elitism: default_elitism(50),
            maxiter: 100,
            run: 100,
            max_fitness: f64::INFINITY,
            keep_best: false,
            update_pop: false,
            seed: None,
            parallel: Parallelism::Off,
            names: Vec::new(),
        }
    }
}

impl GaOptions {
    pub(crate) fn validate(&self, nvars: usize) -> Result<()> {
        for (name, p) in [
            ("pcrossover", self.pcrossover),
            ("pmutation", self.pmutation),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GaError::InvalidParameter(format!(
                    "{name} must be in [0, 1], got {p}"
                )));
            }
        }
        if self.pop_size == 0 {
            return Err(GaError::InvalidParameter(
                "population size cannot be zero".to_string(),
            ));
        }
        if self.elitism > self.pop_size {
            return Err(GaError::InvalidParameter(format!(
                "elitism ({}) exceeds population size ({})",
                self.elitism, self.pop_size
            )));
        }
        if self.pop_size < 10 {
            warn!(
                pop_size = self.pop_size,
                "population sizes below 10 rarely sustain useful diversity"
            );
        }
        if !self.names.is_empty() && self.names.len() != nvars {
            return Err(GaError::ShapeMismatch(format!(
                "{} variable names given for {} variables",
                self.names.len(),
                nvars
            )));
        }
        Ok(())
    }
}

/// Parameters specific to the island model.
#[derive(Debug, Clone)]
pub struct IslandOptions {
    /// Number of islands in the ring.
    pub num_islands: usize,
    /// Fraction of an island that emigrates each epoch.
    pub migration_rate: f64,
    /// Generations evolved between migrations.
    pub migration_interval: usize,
}

impl Default for IslandOptions {
    fn default() -> Self {
        Self {
            num_islands: 4,
            migration_rate: 0.10,
            migration_interval: 10,
        }
    }
}

impl IslandOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.num_islands < 2 {
            return Err(GaError::InvalidParameter(format!(
                "island model needs at least 2 islands, got {}",
                self.num_islands
            )));
        }
        if !(self.migration_rate > 0.0 && self.migration_rate <= 1.0) {
            return Err(GaError::InvalidParameter(format!(
                "migration rate must be in (0, 1], got {}",
                self.migration_rate
            )));
        }
        if self.migration_interval == 0 {
            return Err(GaError::InvalidParameter(
                "migration interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-island population size for a total of `pop_size`.
    pub fn island_size(&self, pop_size: usize) -> usize {
        (pop_size / self.num_islands).max(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_elitism_is_five_percent_at_least_one() {
        assert_eq!(default_elitism(50), 3);
        assert_eq!(default_elitism(100), 5);
        assert_eq!(default_elitism(10), 1);
        assert_eq!(default_elitism(1), 1);
    }

    #[test]
    fn probabilities_are_checked() {
        let mut options = GaOptions::default();
        options.pcrossover = 1.5;
        assert!(matches!(
            options.validate(3),
            Err(GaError::InvalidParameter(_))
        ));
        options.pcrossover = 0.8;
        options.pmutation = -0.1;
        assert!(options.validate(3).is_err());
    }

    #[test]
    fn elitism_cannot_exceed_population() {
        let options = GaOptions {
            elitism: 51,
            ..GaOptions::default()
        };
        assert!(options.validate(3).is_err());
        let options = GaOptions {
            elitism: 50,
            ..GaOptions::default()
        };
        assert!(options.validate(3).is_ok());
    }

    #[test]
    fn names_must_match_the_variable_count() {
        let options = GaOptions {
            names: vec!["x".to_string()],
            ..GaOptions::default()
        };
        assert!(options.validate(2).is_err());
        assert!(options.validate(1).is_ok());
    }

    #[test]
    fn island_size_has_a_floor_of_ten() {
        let options = IslandOptions::default();
        assert_eq!(options.island_size(100), 25);
        assert_eq!(options.island_size(20), 10);
    }

    #[test]
    fn island_parameters_are_checked() {
        let mut options = IslandOptions::default();
        options.num_islands = 1;
        assert!(options.validate().is_err());
        options = IslandOptions::default();
        options.migration_rate = 0.0;
        assert!(options.validate().is_err());
        options = IslandOptions::default();
        options.migration_interval = 0;
        assert!(options.validate().is_err());
    }
}
