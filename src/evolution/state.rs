//! Search state and per-generation summaries.

use crate::encoding::{Encoding, Genome};

/// One summary row: order statistics of the generation's finite fitness.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSummary {
    /// Largest fitness.
    pub max: f64,
    /// Mean fitness.
    pub mean: f64,
    /// First quartile.
    pub q1: f64,
    /// Median fitness.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Smallest fitness.
    pub min: f64,
}

/// Linear-interpolation quantile of an ascending-sorted slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Summarizes the finite entries of a fitness vector.
pub(crate) fn summarize(fitness: &[f64]) -> GenerationSummary {
    let mut finite: Vec<f64> = fitness.iter().copied().filter(|v| v.is_finite()).collect();
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if finite.is_empty() {
        return GenerationSummary {
            max: f64::NAN,
            mean: f64::NAN,
            q1: f64::NAN,
            median: f64::NAN,
            q3: f64::NAN,
            min: f64::NAN,
        };
    }
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    GenerationSummary {
        max: *finite.last().unwrap_or(&f64::NAN),
        mean,
        q1: quantile(&finite, 0.25),
        median: quantile(&finite, 0.5),
        q3: quantile(&finite, 0.75),
        min: finite[0],
    }
}

/// The mutable state a driver owns, updated once per generation.
#[derive(Debug, Clone)]
pub struct SearchState<E: Encoding> {
    /// Completed generations; 0 before the first step.
    pub iter: usize,
    /// The current population, `pop_size` rows.
    pub population: Vec<Genome<E>>,
    /// Fitness aligned with the population; `NaN` marks missing entries.
    pub fitness: Vec<f64>,
    /// One summary row per completed generation.
    pub summary: Vec<GenerationSummary>,
    /// Best fitness observed so far; monotone non-decreasing.
    pub fitness_value: f64,
    /// The distinct rows attaining `fitness_value`.
    pub solution: Vec<Genome<E>>,
    /// Per-generation snapshots of the tying rows, when enabled.
    pub best_history: Option<Vec<Vec<Genome<E>>>>,
    /// Consecutive generations without strict improvement.
    pub run_since: usize,
}

impl<E: Encoding> SearchState<E> {
    pub(crate) fn new(population: Vec<Genome<E>>, keep_best: bool) -> Self {
        let fitness = vec![f64::NAN; population.len()];
        Self {
            iter: 0,
            population,
            fitness,
            summary: Vec::new(),
            fitness_value: f64::NEG_INFINITY,
            solution: Vec::new(),
            best_history: keep_best.then(Vec::new),
            run_since: 0,
        }
    }

    /// Distinct rows of the current population whose fitness equals
    /// `target`.
    fn tying_rows(&self, target: f64) -> Vec<Genome<E>> {
        let mut rows: Vec<Genome<E>> = Vec::new();
        for (genome, &f) in self.population.iter().zip(&self.fitness) {
            if f == target && !rows.contains(genome) {
                rows.push(genome.clone());
            }
        }
        rows
    }

    /// Recomputes the best-so-far value, the solution set, and the
    /// no-improvement counter from the current fitness vector. Call only
    /// with a fully evaluated generation.
    pub(crate) fn update_best(&mut self) {
        let current_max = self
            .fitness
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);

        if current_max > self.fitness_value {
            self.fitness_value = current_max;
            self.run_since = 0;
            self.solution = self.tying_rows(current_max);
        } else {
            self.run_since += 1;
            if current_max == self.fitness_value {
                for row in self.tying_rows(current_max) {
                    if !self.solution.contains(&row) {
                        self.solution.push(row);
                    }
                }
            }
        }

        if self.best_history.is_some() {
            let rows = self.tying_rows(current_max);
            self.best_history.as_mut().unwrap().push(rows);
        }
    }
}
