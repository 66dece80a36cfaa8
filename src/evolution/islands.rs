//! # Island Driver
//!
//! [`IslandGa`] partitions the population across `num_islands` islands
//! that evolve independently for `migration_interval` generations per
//! epoch, then exchange their best rows around a one-way ring. Islands
//! evolve concurrently when a worker pool is configured; migration and
//! stopping checks run serially between epochs, so results are identical
//! at any worker count.

use tracing::debug;

use super::driver::Ga;
use super::engine::{ranked_indices, Engine};
use super::options::{GaOptions, IslandOptions};
use super::state::{GenerationSummary, SearchState};
use crate::encoding::{Encoding, Genome};
use crate::error::Result;
use crate::fitness::{spawn_pool, Fitness};
use crate::rng::GaRng;

use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};

/// The terminal state of one island.
#[derive(Debug, Clone)]
pub struct IslandReport<E: Encoding> {
    /// The island's final population.
    pub population: Vec<Genome<E>>,
    /// Fitness aligned with the population.
    pub fitness: Vec<f64>,
    /// The island's best-so-far fitness.
    pub fitness_value: f64,
    /// The distinct rows attaining the island's best.
    pub solution: Vec<Genome<E>>,
    /// One summary row per island generation.
    pub summary: Vec<GenerationSummary>,
    /// Generations since the island's last strict improvement.
    pub run_since: usize,
}

/// The immutable outcome of an island run.
#[derive(Debug, Clone)]
pub struct IslandGaResult<E: Encoding> {
    /// The encoding the run searched over.
    pub encoding: E,
    /// The panmictic parameters, applied per island.
    pub options: GaOptions,
    /// The island-model parameters.
    pub island_options: IslandOptions,
    /// The seed the run actually used.
    pub seed: u64,
    /// Generations completed per island.
    pub iter: usize,
    /// Migration epochs completed; `iter / migration_interval`.
    pub epoch: usize,
    /// The best fitness across all islands.
    pub fitness_value: f64,
    /// The distinct rows attaining the best, over the attaining islands.
    pub solution: Vec<Genome<E>>,
    /// Per-island terminal states.
    pub islands: Vec<IslandReport<E>>,
}

struct IslandSlot<E: Encoding> {
    state: SearchState<E>,
    rng: GaRng,
    seed: u64,
}

/// The per-island elite count: the archipelago-level `elitism` scaled by
/// the island's share of the population. Stays at least one while elitism
/// is enabled at all, and never exceeds the island size.
fn rescale_elitism(elitism: usize, pop_size: usize, island_size: usize) -> usize {
    if elitism == 0 {
        return 0;
    }
    let scaled = (elitism * island_size) as f64 / pop_size as f64;
    (scaled.round() as usize).clamp(1, island_size)
}

/// A configured island-model genetic algorithm.
pub struct IslandGa<E: Encoding, F: Fitness<E>> {
    inner: Ga<E, F>,
    island_options: IslandOptions,
}

impl<E: Encoding, F: Fitness<E>> IslandGa<E, F> {
    pub(crate) fn new(inner: Ga<E, F>, island_options: IslandOptions) -> Self {
        Self {
            inner,
            island_options,
        }
    }

    /// Runs the archipelago to completion.
    pub fn run(self) -> Result<IslandGaResult<E>> {
        let ga = &self.inner;
        let num_islands = self.island_options.num_islands;
        let interval = self.island_options.migration_interval;
        let island_size = self.island_options.island_size(ga.options.pop_size);
        // Panmictic parameters apply per island with the island size;
        // elitism rescales alongside pop_size.
        let island_elitism = rescale_elitism(
            ga.options.elitism,
            ga.options.pop_size,
            island_size,
        );
        let island_options = GaOptions {
            pop_size: island_size,
            elitism: island_elitism,
            ..ga.options.clone()
        };

        let root_seed = ga.options.seed.unwrap_or_else(rand::random);
        let mut rng = GaRng::from_seed(root_seed);
        let pool = spawn_pool(&ga.options.parallel)?;

        // Suggestion rows are dealt round-robin, one island at a time.
        let mut suggestions: Vec<Vec<Genome<E>>> = vec![Vec::new(); num_islands];
        for (i, row) in ga.suggestions.iter().enumerate() {
            suggestions[i % num_islands].push(row.clone());
        }

        let mut slots: Vec<IslandSlot<E>> = Vec::with_capacity(num_islands);
        for (island, island_suggestions) in suggestions.iter().enumerate() {
            let seed = GaRng::derive_seed(root_seed, island as u64);
            let mut island_rng = GaRng::from_seed(seed);
            let population = ga.ops.init.init(
                &ga.encoding,
                island_size,
                island_suggestions,
                &mut island_rng,
            )?;
            slots.push(IslandSlot {
                state: SearchState::new(population, ga.options.keep_best),
                rng: island_rng,
                seed,
            });
        }

        let total_epochs = ga.options.maxiter / interval;
        let mut epoch = 0;

        while epoch < total_epochs {
            // Islands own their inputs and run independently; fitness
            // evaluation inside an island stays serial so the fan-out is
            // never nested.
            let evolve = |slot: &mut IslandSlot<E>| -> Result<()> {
                let engine = Engine {
                    encoding: &ga.encoding,
                    objective: &ga.objective,
                    ops: &ga.ops,
                    options: &island_options,
                    post_fitness: ga.post_fitness.as_deref(),
                    mutation_rate: ga.mutation_rate.as_deref(),
                    hybridizer: ga.hybridizer.as_ref(),
                    pool: None,
                    root_seed: slot.seed,
                };
                for _ in 0..interval {
                    if slot.state.iter > 0 {
                        engine.breed(&mut slot.state, &mut slot.rng)?;
                    }
                    engine.score_generation(&mut slot.state, &mut slot.rng)?;
                    slot.state.iter += 1;
                    if let Some(monitor) = &ga.monitor {
                        monitor(&slot.state);
                    }
                }
                Ok(())
            };
            match &pool {
                Some(handle) => handle
                    .get()
                    .install(|| slots.par_iter_mut().map(evolve).collect::<Result<Vec<_>>>())
                    .map(|_| ())?,
                None => {
                    for slot in &mut slots {
                        evolve(slot)?;
                    }
                }
            }

            self.migrate(&mut slots, island_size, island_elitism, &mut rng);
            epoch += 1;
            debug!(
                epoch,
                best = slots
                    .iter()
                    .map(|s| s.state.fitness_value)
                    .fold(f64::NEG_INFINITY, f64::max),
                "epoch complete"
            );

            let all_stalled = slots
                .iter()
                .all(|slot| slot.state.run_since >= ga.options.run);
            let all_converged = slots
                .iter()
                .all(|slot| slot.state.fitness_value >= ga.options.max_fitness);
            let flagged = ga
                .stop_flag
                .as_ref()
                .map(|flag| flag.load(std::sync::atomic::Ordering::Relaxed))
                .unwrap_or(false);
            if all_stalled || all_converged || flagged {
                break;
            }
        }

        Ok(self.into_result(slots, island_options, root_seed, epoch, interval))
    }

    /// Ring migration: each island sends clones of its best rows to its
    /// successor, which replaces uniformly chosen non-elite rows. Elites
    /// (the receiver's top `island_elitism` rows by current fitness) are
    /// protected.
    fn migrate(
        &self,
        slots: &mut [IslandSlot<E>],
        island_size: usize,
        island_elitism: usize,
        rng: &mut GaRng,
    ) {
        let num_islands = slots.len();
        let migrants_per_island =
            ((self.island_options.migration_rate * island_size as f64) as usize).max(1);

        // Emigrant sets are snapshotted before any replacement, so a row
        // always travels exactly one hop per epoch.
        let emigrants: Vec<Vec<(Genome<E>, f64)>> = slots
            .iter()
            .map(|slot| {
                ranked_indices(&slot.state.fitness)
                    .into_iter()
                    .take(migrants_per_island)
                    .map(|i| (slot.state.population[i].clone(), slot.state.fitness[i]))
                    .collect()
            })
            .collect();

        for (island, rows) in emigrants.into_iter().enumerate() {
            let dest = (island + 1) % num_islands;
            let protected: Vec<usize> = ranked_indices(&slots[dest].state.fitness)
                .into_iter()
                .take(island_elitism)
                .collect();
            let mut open: Vec<usize> = (0..island_size)
                .filter(|i| !protected.contains(i))
                .collect();
            for (genome, fitness) in rows {
                if open.is_empty() {
                    break;
                }
                let slot = open.swap_remove(rng.index(open.len()));
                slots[dest].state.population[slot] = genome;
                slots[dest].state.fitness[slot] = fitness;
            }
        }
    }

    fn into_result(
        self,
        slots: Vec<IslandSlot<E>>,
        island_options_applied: GaOptions,
        seed: u64,
        epoch: usize,
        interval: usize,
    ) -> IslandGaResult<E> {
        let fitness_value = slots
            .iter()
            .map(|slot| slot.state.fitness_value)
            .fold(f64::NEG_INFINITY, f64::max);

        let mut solution: Vec<Genome<E>> = Vec::new();
        for slot in &slots {
            if slot.state.fitness_value == fitness_value {
                for row in &slot.state.solution {
                    if !solution.contains(row) {
                        solution.push(row.clone());
                    }
                }
            }
        }

        let islands = slots
            .into_iter()
            .map(|slot| IslandReport {
                population: slot.state.population,
                fitness: slot.state.fitness,
                fitness_value: slot.state.fitness_value,
                solution: slot.state.solution,
                summary: slot.state.summary,
                run_since: slot.state.run_since,
            })
            .collect();

        IslandGaResult {
            encoding: self.inner.encoding,
            options: island_options_applied,
            island_options: self.island_options,
            seed,
            iter: epoch * interval,
            epoch,
            fitness_value,
            solution,
            islands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Binary;
    use crate::fitness::FnFitness;
    use crate::evolution::Ga;

    fn ones(genome: &[u8]) -> f64 {
        genome.iter().map(|&b| b as f64).sum()
    }

    #[test]
    fn epochs_and_iterations_line_up() {
        let result = Ga::builder()
            .encoding(Binary::new(8))
            .fitness(FnFitness(|g: &[u8]| ones(g)))
            .pop_size(40)
            .maxiter(30)
            .seed(6)
            .build_islands(IslandOptions {
                num_islands: 4,
                migration_rate: 0.2,
                migration_interval: 10,
            })
            .unwrap()
            .run()
            .unwrap();

        assert!(result.epoch <= 3);
        assert_eq!(result.iter, result.epoch * 10);
        for island in &result.islands {
            assert_eq!(island.summary.len(), result.iter);
            assert_eq!(island.population.len(), 10);
        }
    }

    #[test]
    fn elitism_rescales_with_the_island_size() {
        // Archipelago-level 5% of 200 equals a 10-row island; per island
        // it must come down to one.
        assert_eq!(rescale_elitism(10, 200, 10), 1);
        assert_eq!(rescale_elitism(0, 200, 10), 0);
        assert_eq!(rescale_elitism(1, 40, 10), 1);
        assert_eq!(rescale_elitism(20, 20, 10), 10);
        assert_eq!(rescale_elitism(8, 80, 20), 2);
    }

    #[test]
    fn small_islands_keep_evolving_under_default_elitism() {
        // pop 200 over 20 islands gives islSize 10, while the archipelago
        // default elitism is also 10; without rescaling every island slot
        // would be elite and the bred populations would be overwritten
        // wholesale each generation. The first epoch sees no migration,
        // so any within-epoch improvement must come from breeding.
        let result = Ga::builder()
            .encoding(Binary::new(16))
            .fitness(FnFitness(|g: &[u8]| ones(g)))
            .pop_size(200)
            .maxiter(30)
            .seed(29)
            .build_islands(IslandOptions {
                num_islands: 20,
                migration_rate: 0.1,
                migration_interval: 10,
            })
            .unwrap()
            .run()
            .unwrap();

        let improved = result
            .islands
            .iter()
            .filter(|island| island.summary[9].max > island.summary[0].max)
            .count();
        assert!(
            improved >= 10,
            "only {improved} of 20 islands improved within the first epoch"
        );
        for island in &result.islands {
            assert_eq!(island.population.len(), 10);
        }
    }

    #[test]
    fn migration_still_replaces_rows_when_elitism_is_large() {
        // With archipelago elitism near the island size, rescaling keeps
        // enough open slots for migrants; every island must end up with
        // the seeded optimum even though variation is disabled.
        let optimum = vec![1u8; 8];
        let result = Ga::builder()
            .encoding(Binary::new(8))
            .fitness(FnFitness(|g: &[u8]| ones(g)))
            .pop_size(40)
            .pcrossover(0.0)
            .pmutation(0.0)
            .elitism(36)
            .maxiter(60)
            .seed(13)
            .suggestions(vec![optimum.clone()])
            .build_islands(IslandOptions {
                num_islands: 4,
                migration_rate: 0.2,
                migration_interval: 5,
            })
            .unwrap()
            .run()
            .unwrap();

        for (i, island) in result.islands.iter().enumerate() {
            assert!(
                island.population.contains(&optimum),
                "island {i} never received the optimum"
            );
        }
        assert_eq!(result.fitness_value, 8.0);
    }

    #[test]
    fn island_best_is_the_max_across_islands() {
        let result = Ga::builder()
            .encoding(Binary::new(8))
            .fitness(FnFitness(|g: &[u8]| ones(g)))
            .pop_size(40)
            .maxiter(40)
            .seed(9)
            .build_islands(IslandOptions::default())
            .unwrap()
            .run()
            .unwrap();

        let island_max = result
            .islands
            .iter()
            .map(|island| island.fitness_value)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.fitness_value, island_max);
        assert!(!result.solution.is_empty());
        for row in &result.solution {
            assert_eq!(ones(row), result.fitness_value);
        }
    }
}
