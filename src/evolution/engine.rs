//! The generation engine: one evaluation/scoring pass and one breeding
//! pass over a [`SearchState`]. Both drivers are thin loops around this
//! module.

use tracing::debug;

use super::state::{summarize, SearchState};
use crate::encoding::{Encoding, Genome};
use crate::error::{GaError, Result};
use crate::evolution::options::GaOptions;
use crate::fitness::{evaluate_generation, Fitness};
use crate::local_search::Hybridizer;
use crate::operators::OperatorSet;
use crate::rng::GaRng;

/// User hook invoked with a read-only view of the state each generation.
pub type MonitorFn<E> = dyn Fn(&SearchState<E>) + Send + Sync;

/// User hook that may transform the state right after evaluation. Its
/// output is re-validated against the invariants.
pub type PostFitnessFn<E> = dyn Fn(&mut SearchState<E>) -> Result<()> + Send + Sync;

/// A mutation rate computed from the current state.
pub type MutationRateFn<E> = dyn Fn(&SearchState<E>) -> f64 + Send + Sync;

/// Indices with finite fitness, sorted best first.
pub(crate) fn ranked_indices(fitness: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len())
        .filter(|&i| fitness[i].is_finite())
        .collect();
    order.sort_by(|&a, &b| {
        fitness[b]
            .partial_cmp(&fitness[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

pub(crate) struct Engine<'a, E: Encoding> {
    pub encoding: &'a E,
    pub objective: &'a dyn Fitness<E>,
    pub ops: &'a OperatorSet<E>,
    pub options: &'a GaOptions,
    pub post_fitness: Option<&'a PostFitnessFn<E>>,
    pub mutation_rate: Option<&'a MutationRateFn<E>>,
    pub hybridizer: Option<&'a Hybridizer<E>>,
    pub pool: Option<&'a rayon::ThreadPool>,
    pub root_seed: u64,
}

impl<E: Encoding> Engine<'_, E> {
    /// Evaluates the pending rows of the current generation, runs the
    /// post-fitness hook and the hybrid step, then folds the results into
    /// best-so-far tracking and the summary log.
    pub(crate) fn score_generation(
        &self,
        state: &mut SearchState<E>,
        rng: &mut GaRng,
    ) -> Result<()> {
        let generation = state.iter + 1;
        evaluate_generation(
            self.encoding,
            &mut state.population,
            &mut state.fitness,
            self.objective,
            generation,
            self.root_seed,
            self.options.update_pop,
            self.pool,
        )?;

        if let Some(hook) = self.post_fitness {
            hook(state)?;
            self.validate_state(state, "post-fitness hook", generation)?;
        }

        if let Some(hybridizer) = self.hybridizer {
            hybridizer.maybe_refine(
                self.encoding,
                &mut state.population,
                &mut state.fitness,
                self.objective,
                generation,
                self.root_seed,
                rng,
            )?;
        }

        state.update_best();
        state.summary.push(summarize(&state.fitness));
        debug!(
            generation,
            best = state.fitness_value,
            run_since = state.run_since,
            "generation scored"
        );
        Ok(())
    }

    /// Produces the next population: elitism snapshot, selection,
    /// crossover, mutation, elite re-insertion. Fitness values of
    /// untouched individuals travel with them; changed rows are marked
    /// missing for the next evaluation pass.
    pub(crate) fn breed(&self, state: &mut SearchState<E>, rng: &mut GaRng) -> Result<()> {
        let generation = state.iter;
        let pop_size = self.options.pop_size;

        let elites = self.top_rows(state, self.options.elitism);

        let outcome = self
            .ops
            .selection
            .select(&state.population, &state.fitness, rng)?;
        let mut next = outcome.parents;
        let mut next_fitness = outcome.fitness;
        if next.len() != pop_size || next_fitness.len() != pop_size {
            return Err(GaError::Configuration(format!(
                "selection `{:?}` returned {} parents for a population of {}",
                self.ops.selection,
                next.len(),
                pop_size
            )));
        }

        for pair in (0..pop_size).step_by(2) {
            if pair + 1 >= pop_size || !rng.chance(self.options.pcrossover) {
                continue;
            }
            let (c0, c1) =
                self.ops
                    .crossover
                    .cross(self.encoding, &next[pair], &next[pair + 1], rng)?;
            if !self.encoding.is_valid(&c0) || !self.encoding.is_valid(&c1) {
                return Err(GaError::OperatorDomainViolation {
                    operator: format!("{:?}", self.ops.crossover),
                    generation,
                });
            }
            next[pair] = c0;
            next[pair + 1] = c1;
            next_fitness[pair] = f64::NAN;
            next_fitness[pair + 1] = f64::NAN;
        }

        let rate = match self.mutation_rate {
            Some(schedule) => {
                let rate = schedule(state);
                if !(0.0..=1.0).contains(&rate) {
                    return Err(GaError::InvalidParameter(format!(
                        "mutation schedule returned {rate} in generation {generation}"
                    )));
                }
                rate
            }
            None => self.options.pmutation,
        };
        for i in 0..pop_size {
            if !rng.chance(rate) {
                continue;
            }
            self.ops.mutation.mutate(self.encoding, &mut next[i], rng)?;
            if !self.encoding.is_valid(&next[i]) {
                return Err(GaError::OperatorDomainViolation {
                    operator: format!("{:?}", self.ops.mutation),
                    generation,
                });
            }
            next_fitness[i] = f64::NAN;
        }

        // The elite rows overwrite the tail; any positions work, the
        // contract is only that the rows survive verbatim.
        let first_slot = pop_size - elites.len();
        for (slot, (genome, fitness)) in elites.into_iter().enumerate() {
            next[first_slot + slot] = genome;
            next_fitness[first_slot + slot] = fitness;
        }

        state.population = next;
        state.fitness = next_fitness;
        Ok(())
    }

    /// The top `count` rows by fitness, best first, missing rows skipped.
    pub(crate) fn top_rows(
        &self,
        state: &SearchState<E>,
        count: usize,
    ) -> Vec<(Genome<E>, f64)> {
        ranked_indices(&state.fitness)
            .into_iter()
            .take(count)
            .map(|i| (state.population[i].clone(), state.fitness[i]))
            .collect()
    }

    fn validate_state(
        &self,
        state: &SearchState<E>,
        operator: &str,
        generation: usize,
    ) -> Result<()> {
        let ok = state.population.len() == self.options.pop_size
            && state.fitness.len() == self.options.pop_size
            && state
                .population
                .iter()
                .all(|genome| self.encoding.is_valid(genome));
        if ok {
            Ok(())
        } else {
            Err(GaError::OperatorDomainViolation {
                operator: operator.to_string(),
                generation,
            })
        }
    }
}
