//! # Panmictic Driver
//!
//! [`Ga`] owns one evolving population and the loop around the
//! generation engine. Configure a run through [`Ga::builder`]:
//!
//! ```rust
//! use genoptim::evolution::Ga;
//! use genoptim::encoding::Binary;
//! use genoptim::fitness::FnFitness;
//!
//! let result = Ga::builder()
//!     .encoding(Binary::new(10))
//!     .fitness(FnFitness(|genome: &[u8]| genome.iter().map(|&b| b as f64).sum()))
//!     .pop_size(20)
//!     .maxiter(50)
//!     .seed(1)
//!     .build()
//!     .unwrap()
//!     .run()
//!     .unwrap();
//!
//! assert!(result.fitness_value <= 10.0);
//! assert_eq!(result.summary.len(), result.iter);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::engine::{Engine, MonitorFn, MutationRateFn, PostFitnessFn};
use super::islands::IslandGa;
use super::options::{default_elitism, GaOptions, IslandOptions};
use super::state::{GenerationSummary, SearchState};
use crate::control;
use crate::encoding::{Encoding, Genome};
use crate::error::{GaError, Result};
use crate::fitness::{spawn_pool, Fitness, Parallelism};
use crate::local_search::{
    Hybridizer, LocalOptimizer, LocalSearchOptions, NelderMead, RealProjection,
};
use crate::operators::{
    Crossover, Mutation, OperatorRegistry, OperatorSet, PopulationInit, Selection,
};
use crate::rng::GaRng;

/// The immutable outcome of a panmictic run.
#[derive(Debug, Clone)]
pub struct GaResult<E: Encoding> {
    /// The encoding the run searched over.
    pub encoding: E,
    /// The parameters of the call.
    pub options: GaOptions,
    /// The seed the run actually used.
    pub seed: u64,
    /// Completed generations.
    pub iter: usize,
    /// The terminal population.
    pub population: Vec<Genome<E>>,
    /// Fitness aligned with the terminal population.
    pub fitness: Vec<f64>,
    /// Best fitness observed over the whole run.
    pub fitness_value: f64,
    /// The distinct rows attaining `fitness_value`.
    pub solution: Vec<Genome<E>>,
    /// One `(max, mean, q1, median, q3, min)` row per generation.
    pub summary: Vec<GenerationSummary>,
    /// Per-generation best-row snapshots, when `keep_best` was set.
    pub best_history: Option<Vec<Vec<Genome<E>>>>,
}

impl<E: Encoding> GaResult<E> {
    pub(crate) fn from_state(
        encoding: E,
        options: GaOptions,
        state: SearchState<E>,
        seed: u64,
    ) -> Self {
        Self {
            encoding,
            options,
            seed,
            iter: state.iter,
            population: state.population,
            fitness: state.fitness,
            fitness_value: state.fitness_value,
            solution: state.solution,
            summary: state.summary,
            best_history: state.best_history,
        }
    }
}

/// A configured panmictic genetic algorithm.
pub struct Ga<E: Encoding, F: Fitness<E>> {
    pub(crate) encoding: E,
    pub(crate) objective: F,
    pub(crate) options: GaOptions,
    pub(crate) ops: OperatorSet<E>,
    pub(crate) suggestions: Vec<Genome<E>>,
    pub(crate) monitor: Option<Arc<MonitorFn<E>>>,
    pub(crate) post_fitness: Option<Arc<PostFitnessFn<E>>>,
    pub(crate) mutation_rate: Option<Arc<MutationRateFn<E>>>,
    pub(crate) hybridizer: Option<Hybridizer<E>>,
    pub(crate) stop_flag: Option<Arc<AtomicBool>>,
}

impl<E: Encoding, F: Fitness<E>> Ga<E, F> {
    /// Starts configuring a run.
    pub fn builder() -> GaBuilder<E, F> {
        GaBuilder::new()
    }

    pub(crate) fn should_stop(&self, state: &SearchState<E>) -> bool {
        if state.run_since >= self.options.run {
            debug!(run = self.options.run, "stopping: no improvement");
            return true;
        }
        if state.fitness_value >= self.options.max_fitness {
            debug!(best = state.fitness_value, "stopping: target fitness reached");
            return true;
        }
        if let Some(flag) = &self.stop_flag {
            if flag.load(Ordering::Relaxed) {
                debug!("stopping: caller raised the stop flag");
                return true;
            }
        }
        false
    }

    /// Runs the search to completion.
    ///
    /// A driver-owned worker pool is started when `parallel` asks for one
    /// and is torn down on every exit path; a caller-supplied pool is
    /// used but never stopped.
    pub fn run(self) -> Result<GaResult<E>> {
        let root_seed = self.options.seed.unwrap_or_else(rand::random);
        let mut rng = GaRng::from_seed(root_seed);
        let pool = spawn_pool(&self.options.parallel)?;

        let population = self.ops.init.init(
            &self.encoding,
            self.options.pop_size,
            &self.suggestions,
            &mut rng,
        )?;
        let mut state = SearchState::new(population, self.options.keep_best);

        let engine = Engine {
            encoding: &self.encoding,
            objective: &self.objective,
            ops: &self.ops,
            options: &self.options,
            post_fitness: self.post_fitness.as_deref(),
            mutation_rate: self.mutation_rate.as_deref(),
            hybridizer: self.hybridizer.as_ref(),
            pool: pool.as_ref().map(|handle| handle.get()),
            root_seed,
        };

        while state.iter < self.options.maxiter {
            engine.score_generation(&mut state, &mut rng)?;
            state.iter += 1;
            if let Some(monitor) = &self.monitor {
                monitor(&state);
            }
            if self.should_stop(&state) || state.iter >= self.options.maxiter {
                break;
            }
            engine.breed(&mut state, &mut rng)?;
        }

        Ok(GaResult::from_state(
            self.encoding,
            self.options,
            state,
            root_seed,
        ))
    }
}

/// Builder for [`Ga`] and [`IslandGa`].
pub struct GaBuilder<E: Encoding, F: Fitness<E>> {
    encoding: Option<E>,
    objective: Option<F>,
    pop_size: usize,
    pcrossover: f64,
    pmutation: f64,
    elitism: Option<usize>,
    maxiter: Option<usize>,
    run: Option<usize>,
    max_fitness: f64,
    keep_best: bool,
    update_pop: bool,
    seed: Option<u64>,
    parallel: Parallelism,
    names: Vec<String>,
    suggestions: Vec<Genome<E>>,
    registry: Option<OperatorRegistry<E>>,
    init: Option<Arc<dyn PopulationInit<E>>>,
    selection: Option<Arc<dyn Selection<E>>>,
    crossover: Option<Arc<dyn Crossover<E>>>,
    mutation: Option<Arc<dyn Mutation<E>>>,
    monitor: Option<Arc<MonitorFn<E>>>,
    post_fitness: Option<Arc<PostFitnessFn<E>>>,
    mutation_rate: Option<Arc<MutationRateFn<E>>>,
    local_search: Option<LocalSearchOptions>,
    local_optimizer: Option<Arc<dyn LocalOptimizer>>,
    projection: Option<Arc<dyn RealProjection<E>>>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl<E: Encoding, F: Fitness<E>> GaBuilder<E, F> {
    fn new() -> Self {
        Self {
            encoding: None,
            objective: None,
            pop_size: 50,
            pcrossover: 0.8,
            pmutation: 0.1,
            elitism: None,
            maxiter: None,
            run: None,
            max_fitness: f64::INFINITY,
            keep_best: false,
            update_pop: false,
            seed: None,
            parallel: Parallelism::Off,
            names: Vec::new(),
            suggestions: Vec::new(),
            registry: None,
            init: None,
            selection: None,
            crossover: None,
            mutation: None,
            monitor: None,
            post_fitness: None,
            mutation_rate: None,
            local_search: None,
            local_optimizer: None,
            projection: None,
            stop_flag: None,
        }
    }

    /// Sets the encoding to search over. Required.
    pub fn encoding(mut self, encoding: E) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Sets the fitness function. Required. Higher is better.
    pub fn fitness(mut self, objective: F) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Population size (default 50).
    pub fn pop_size(mut self, pop_size: usize) -> Self {
        self.pop_size = pop_size;
        self
    }

    /// Crossover probability (default 0.8).
    pub fn pcrossover(mut self, p: f64) -> Self {
        self.pcrossover = p;
        self
    }

    /// Mutation probability (default 0.1).
    pub fn pmutation(mut self, p: f64) -> Self {
        self.pmutation = p;
        self
    }

    /// Number of elites carried verbatim (default 5% of the population,
    /// at least one).
    pub fn elitism(mut self, elitism: usize) -> Self {
        self.elitism = Some(elitism);
        self
    }

    /// Generation ceiling (default 100 panmictic, 1000 island).
    pub fn maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = Some(maxiter);
        self
    }

    /// No-improvement stopping window (default `maxiter`).
    pub fn run_window(mut self, run: usize) -> Self {
        self.run = Some(run);
        self
    }

    /// Target fitness; the run stops once it is reached (default `+∞`).
    pub fn max_fitness(mut self, max_fitness: f64) -> Self {
        self.max_fitness = max_fitness;
        self
    }

    /// Record per-generation best rows in the result (default off).
    pub fn keep_best(mut self, keep_best: bool) -> Self {
        self.keep_best = keep_best;
        self
    }

    /// Let the fitness function replace rows it evaluates (default off).
    pub fn update_pop(mut self, update_pop: bool) -> Self {
        self.update_pop = update_pop;
        self
    }

    /// Fixes the root seed for a reproducible run.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Where fitness evaluation runs (default serial).
    pub fn parallel(mut self, parallel: Parallelism) -> Self {
        self.parallel = parallel;
        self
    }

    /// Decision-variable names for presentation layers.
    pub fn names<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Seeds the initial population with known-good rows. Extra rows are
    /// truncated; missing rows are sampled.
    pub fn suggestions(mut self, suggestions: Vec<Genome<E>>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Replaces the builtin operator registry, letting the process-wide
    /// default names resolve to custom operators registered under them.
    pub fn registry(mut self, registry: OperatorRegistry<E>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Overrides the population initializer.
    pub fn init_operator<O: PopulationInit<E> + 'static>(mut self, op: O) -> Self {
        self.init = Some(Arc::new(op));
        self
    }

    /// Overrides the selection strategy.
    pub fn selection<O: Selection<E> + 'static>(mut self, op: O) -> Self {
        self.selection = Some(Arc::new(op));
        self
    }

    /// Overrides the crossover strategy.
    pub fn crossover<O: Crossover<E> + 'static>(mut self, op: O) -> Self {
        self.crossover = Some(Arc::new(op));
        self
    }

    /// Overrides the mutation strategy.
    pub fn mutation<O: Mutation<E> + 'static>(mut self, op: O) -> Self {
        self.mutation = Some(Arc::new(op));
        self
    }

    /// Installs a per-generation observer of the (read-only) state.
    pub fn monitor<M: Fn(&SearchState<E>) + Send + Sync + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Some(Arc::new(monitor));
        self
    }

    /// Installs a hook run right after fitness evaluation; its output is
    /// re-validated against the search invariants.
    pub fn post_fitness<H>(mut self, hook: H) -> Self
    where
        H: Fn(&mut SearchState<E>) -> Result<()> + Send + Sync + 'static,
    {
        self.post_fitness = Some(Arc::new(hook));
        self
    }

    /// Replaces the scalar mutation probability with a function of the
    /// state, evaluated once per generation.
    pub fn mutation_rate<R>(mut self, rate: R) -> Self
    where
        R: Fn(&SearchState<E>) -> f64 + Send + Sync + 'static,
    {
        self.mutation_rate = Some(Arc::new(rate));
        self
    }

    /// Enables hybrid local search with default settings.
    pub fn optim(self, enabled: bool) -> Self {
        if enabled {
            self.local_search(LocalSearchOptions::default())
        } else {
            self
        }
    }

    /// Enables hybrid local search with explicit settings.
    pub fn local_search(mut self, options: LocalSearchOptions) -> Self {
        self.local_search = Some(options);
        self
    }

    /// Overrides the inner optimizer used by local search.
    pub fn local_optimizer<O: LocalOptimizer + 'static>(mut self, optimizer: O) -> Self {
        self.local_optimizer = Some(Arc::new(optimizer));
        self
    }

    /// Supplies the projection local search needs for encodings without
    /// a built-in one.
    pub fn projection<P: RealProjection<E> + 'static>(mut self, projection: P) -> Self {
        self.projection = Some(Arc::new(projection));
        self
    }

    /// Installs a flag the caller (typically a monitor) can raise to stop
    /// the run at the next generation boundary.
    pub fn stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    fn assemble(self, default_maxiter: usize) -> Result<Ga<E, F>> {
        let encoding = self
            .encoding
            .ok_or_else(|| GaError::Configuration("an encoding is required".to_string()))?;
        let objective = self
            .objective
            .ok_or_else(|| GaError::Configuration("a fitness function is required".to_string()))?;

        let maxiter = self.maxiter.unwrap_or(default_maxiter);
        let options = GaOptions {
            pop_size: self.pop_size,
            pcrossover: self.pcrossover,
            pmutation: self.pmutation,
            elitism: self.elitism.unwrap_or_else(|| default_elitism(self.pop_size)),
            maxiter,
            run: self.run.unwrap_or(maxiter),
            max_fitness: self.max_fitness,
            keep_best: self.keep_best,
            update_pop: self.update_pop,
            seed: self.seed,
            parallel: self.parallel,
            names: self.names,
        };
        options.validate(encoding.nvars())?;

        for (i, suggestion) in self.suggestions.iter().enumerate() {
            if suggestion.len() != encoding.nvars() {
                return Err(GaError::ShapeMismatch(format!(
                    "suggestion row {} has {} columns, encoding declares {}",
                    i,
                    suggestion.len(),
                    encoding.nvars()
                )));
            }
        }

        // Default names are snapshotted here, so concurrent runs keep the
        // table they were configured against.
        let names = control::defaults().for_kind(encoding.kind()).clone();
        let registry = self.registry.unwrap_or_else(E::builtin_operators);
        let ops = OperatorSet {
            init: match self.init {
                Some(op) => op,
                None => registry.init(&names.init)?,
            },
            selection: match self.selection {
                Some(op) => op,
                None => registry.selection(&names.selection)?,
            },
            crossover: match self.crossover {
                Some(op) => op,
                None => registry.crossover(&names.crossover)?,
            },
            mutation: match self.mutation {
                Some(op) => op,
                None => registry.mutation(&names.mutation)?,
            },
        };

        let hybridizer = match self.local_search {
            Some(ls_options) => {
                ls_options.validate()?;
                let optimizer = self
                    .local_optimizer
                    .unwrap_or_else(|| Arc::new(NelderMead::default()));
                let projection = self.projection.or_else(E::builtin_projection);
                Some(Hybridizer::new(ls_options, optimizer, projection))
            }
            None => None,
        };

        Ok(Ga {
            encoding,
            objective,
            options,
            ops,
            suggestions: self.suggestions,
            monitor: self.monitor,
            post_fitness: self.post_fitness,
            mutation_rate: self.mutation_rate,
            hybridizer,
            stop_flag: self.stop_flag,
        })
    }

    /// Validates the configuration and produces a panmictic [`Ga`].
    ///
    /// # Errors
    ///
    /// All configuration problems surface here: missing encoding or
    /// fitness, probabilities outside `[0, 1]`, `elitism > pop_size`,
    /// malformed suggestions or names, unknown operator names.
    pub fn build(self) -> Result<Ga<E, F>> {
        self.assemble(100)
    }

    /// Validates the configuration and produces an [`IslandGa`].
    pub fn build_islands(self, island_options: IslandOptions) -> Result<IslandGa<E, F>> {
        island_options.validate()?;
        let inner = self.assemble(1000)?;
        Ok(IslandGa::new(inner, island_options))
    }
}
