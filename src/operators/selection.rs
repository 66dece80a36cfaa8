//! Selection strategies.
//!
//! All four built-ins work for every encoding: they only inspect fitness
//! values and clone genomes. Each one samples `popSize` parents *with*
//! replacement and carries the parents' fitness along, and none of them
//! will ever return an individual whose fitness entry is missing.

use crate::encoding::{Encoding, Genome};
use crate::error::{GaError, Result};
use crate::operators::registry::OperatorRegistry;
use crate::operators::{Selection, SelectionOutcome};
use crate::rng::GaRng;

/// Registers the encoding-agnostic selection strategies under their
/// default names.
pub fn register_generic<E: Encoding>(registry: &mut OperatorRegistry<E>) {
    registry.register_selection("linear_rank", LinearRankSelection::default());
    registry.register_selection("nonlinear_rank", NonlinearRankSelection::default());
    registry.register_selection("roulette", RouletteSelection::new());
    registry.register_selection("tournament", TournamentSelection::default());
}

/// Indices of individuals that may legally be selected, i.e. those with a
/// finite fitness entry.
fn selectable(population_len: usize, fitness: &[f64]) -> Result<Vec<usize>> {
    if population_len == 0 {
        return Err(GaError::EmptyPopulation);
    }
    if fitness.len() != population_len {
        return Err(GaError::Configuration(format!(
            "fitness vector size ({}) does not match population size ({})",
            fitness.len(),
            population_len
        )));
    }
    let valid: Vec<usize> = (0..population_len)
        .filter(|&i| fitness[i].is_finite())
        .collect();
    if valid.is_empty() {
        return Err(GaError::Configuration(
            "selection invoked with no finite fitness values".to_string(),
        ));
    }
    Ok(valid)
}

/// `valid` sorted worst-to-best by fitness.
fn ranked_ascending(valid: &[usize], fitness: &[f64]) -> Vec<usize> {
    let mut ranked = valid.to_vec();
    ranked.sort_by(|&a, &b| {
        fitness[a]
            .partial_cmp(&fitness[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Draws `count` indices from `ranked` using per-slot weights, returning
/// population indices.
fn sample_weighted(
    ranked: &[usize],
    weights: &[f64],
    count: usize,
    rng: &mut GaRng,
) -> Vec<usize> {
    let total: f64 = weights.iter().sum();
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut acc = 0.0;
    for w in weights {
        acc += w / total;
        cumulative.push(acc);
    }
    if let Some(last) = cumulative.last_mut() {
        *last = 1.0;
    }
    (0..count)
        .map(|_| {
            let u = rng.uniform();
            let slot = cumulative.partition_point(|&c| c < u).min(ranked.len() - 1);
            ranked[slot]
        })
        .collect()
}

fn gather<E: Encoding>(
    population: &[Genome<E>],
    fitness: &[f64],
    chosen: Vec<usize>,
) -> SelectionOutcome<E> {
    SelectionOutcome {
        parents: chosen.iter().map(|&i| population[i].clone()).collect(),
        fitness: chosen.iter().map(|&i| fitness[i]).collect(),
    }
}

/// Linear rank selection.
///
/// Selection probability grows linearly with rank. The pressure parameter
/// `s ∈ [1, 2]` interpolates between uniform choice (`s = 1`) and the
/// steepest linear bias (`s = 2`), where the best individual is selected
/// with probability `s / N`.
#[derive(Debug, Clone, Copy)]
pub struct LinearRankSelection {
    pressure: f64,
}

impl LinearRankSelection {
    /// Creates the strategy with the given pressure.
    ///
    /// # Errors
    ///
    /// Returns [`GaError::InvalidParameter`] unless `pressure ∈ [1, 2]`.
    pub fn with_pressure(pressure: f64) -> Result<Self> {
        if !(1.0..=2.0).contains(&pressure) {
            return Err(GaError::InvalidParameter(format!(
                "rank selection pressure must be in [1, 2], got {pressure}"
            )));
        }
        Ok(Self { pressure })
    }
}

impl Default for LinearRankSelection {
    fn default() -> Self {
        Self { pressure: 1.5 }
    }
}

impl<E: Encoding> Selection<E> for LinearRankSelection {
    fn select(
        &self,
        population: &[Genome<E>],
        fitness: &[f64],
        rng: &mut GaRng,
    ) -> Result<SelectionOutcome<E>> {
        let valid = selectable(population.len(), fitness)?;
        let ranked = ranked_ascending(&valid, fitness);
        let n = ranked.len() as f64;
        let s = self.pressure;
        // Slot 0 is the worst; rank r runs 1..=n with r = n the best.
        let weights: Vec<f64> = (0..ranked.len())
            .map(|slot| {
                let r = (slot + 1) as f64;
                if ranked.len() == 1 {
                    1.0
                } else {
                    (2.0 - s) / n + 2.0 * (r - 1.0) * (s - 1.0) / (n * (n - 1.0))
                }
            })
            .collect();
        let chosen = sample_weighted(&ranked, &weights, population.len(), rng);
        Ok(gather(population, fitness, chosen))
    }
}

/// Nonlinear (geometric) rank selection.
///
/// The best individual is picked with probability `q`, the second best
/// with `q(1 - q)`, and so on; ties in fitness still occupy distinct
/// ranks. Heavier tails than [`LinearRankSelection`] for small `q`.
#[derive(Debug, Clone, Copy)]
pub struct NonlinearRankSelection {
    q: f64,
}

impl NonlinearRankSelection {
    /// Creates the strategy with success probability `q`.
    ///
    /// # Errors
    ///
    /// Returns [`GaError::InvalidParameter`] unless `q ∈ (0, 1)`.
    pub fn with_q(q: f64) -> Result<Self> {
        if q <= 0.0 || q >= 1.0 {
            return Err(GaError::InvalidParameter(format!(
                "nonlinear rank parameter must be in (0, 1), got {q}"
            )));
        }
        Ok(Self { q })
    }
}

impl Default for NonlinearRankSelection {
    fn default() -> Self {
        Self { q: 0.25 }
    }
}

impl<E: Encoding> Selection<E> for NonlinearRankSelection {
    fn select(
        &self,
        population: &[Genome<E>],
        fitness: &[f64],
        rng: &mut GaRng,
    ) -> Result<SelectionOutcome<E>> {
        let valid = selectable(population.len(), fitness)?;
        let ranked = ranked_ascending(&valid, fitness);
        let n = ranked.len();
        let weights: Vec<f64> = (0..n)
            .map(|slot| {
                // slot n-1 is the best and gets weight q(1-q)^0.
                let behind = (n - 1 - slot) as f64;
                self.q * (1.0 - self.q).powf(behind)
            })
            .collect();
        let chosen = sample_weighted(&ranked, &weights, population.len(), rng);
        Ok(gather(population, fitness, chosen))
    }
}

/// Fitness-proportional (roulette-wheel) selection.
///
/// Weights are fitness values shifted so the worst selectable individual
/// sits just above zero; with all values equal the choice degenerates to
/// uniform.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouletteSelection;

impl RouletteSelection {
    pub fn new() -> Self {
        Self
    }
}

impl<E: Encoding> Selection<E> for RouletteSelection {
    fn select(
        &self,
        population: &[Genome<E>],
        fitness: &[f64],
        rng: &mut GaRng,
    ) -> Result<SelectionOutcome<E>> {
        let valid = selectable(population.len(), fitness)?;
        let min = valid
            .iter()
            .map(|&i| fitness[i])
            .fold(f64::INFINITY, f64::min);
        let shifted: Vec<f64> = valid.iter().map(|&i| fitness[i] - min).collect();
        let sum: f64 = shifted.iter().sum();
        let weights: Vec<f64> = if sum <= 0.0 {
            vec![1.0; valid.len()]
        } else {
            shifted
        };
        let chosen = sample_weighted(&valid, &weights, population.len(), rng);
        Ok(gather(population, fitness, chosen))
    }
}

/// Tournament selection: each slot is filled by the fittest of `k`
/// uniformly drawn contenders.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelection {
    k: usize,
}

impl TournamentSelection {
    /// Creates the strategy with tournament size `k`.
    ///
    /// # Errors
    ///
    /// Returns [`GaError::InvalidParameter`] when `k` is zero.
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(GaError::InvalidParameter(
                "tournament size must be at least 1".to_string(),
            ));
        }
        Ok(Self { k })
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self { k: 3 }
    }
}

impl<E: Encoding> Selection<E> for TournamentSelection {
    fn select(
        &self,
        population: &[Genome<E>],
        fitness: &[f64],
        rng: &mut GaRng,
    ) -> Result<SelectionOutcome<E>> {
        let valid = selectable(population.len(), fitness)?;
        let chosen: Vec<usize> = (0..population.len())
            .map(|_| {
                let mut best = valid[rng.index(valid.len())];
                for _ in 1..self.k {
                    let contender = valid[rng.index(valid.len())];
                    if fitness[contender] > fitness[best] {
                        best = contender;
                    }
                }
                best
            })
            .collect();
        Ok(gather(population, fitness, chosen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Binary;

    fn population() -> (Vec<Vec<u8>>, Vec<f64>) {
        let pop = vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]];
        let fitness = vec![0.0, 1.0, 2.0, 3.0];
        (pop, fitness)
    }

    #[test]
    fn all_strategies_return_pop_size_parents() {
        let (pop, fit) = population();
        let mut rng = GaRng::from_seed(1);
        let strategies: Vec<Box<dyn Selection<Binary>>> = vec![
            Box::new(LinearRankSelection::default()),
            Box::new(NonlinearRankSelection::default()),
            Box::new(RouletteSelection::new()),
            Box::new(TournamentSelection::default()),
        ];
        for s in strategies {
            let out = s.select(&pop, &fit, &mut rng).unwrap();
            assert_eq!(out.parents.len(), pop.len());
            assert_eq!(out.fitness.len(), pop.len());
            assert!(out.fitness.iter().all(|f| f.is_finite()));
        }
    }

    #[test]
    fn missing_fitness_rows_are_never_selected() {
        let pop = vec![vec![0, 0], vec![1, 1], vec![1, 0]];
        let fitness = vec![f64::NAN, 5.0, f64::NAN];
        let mut rng = GaRng::from_seed(7);
        let out = <TournamentSelection as Selection<Binary>>::select(
            &TournamentSelection::default(),
            &pop,
            &fitness,
            &mut rng,
        )
        .unwrap();
        assert!(out.parents.iter().all(|p| *p == vec![1, 1]));
    }

    #[test]
    fn linear_rank_prefers_fitter_individuals() {
        let (pop, fit) = population();
        let mut rng = GaRng::from_seed(99);
        let s = LinearRankSelection::with_pressure(2.0).unwrap();
        let mut counts = [0usize; 4];
        for _ in 0..200 {
            let out = Selection::<Binary>::select(&s, &pop, &fit, &mut rng).unwrap();
            for p in &out.parents {
                let idx = (p[0] * 2 + p[1]) as usize;
                counts[idx] += 1;
            }
        }
        assert!(counts[3] > counts[0]);
    }

    #[test]
    fn pressure_outside_range_is_rejected() {
        assert!(LinearRankSelection::with_pressure(0.5).is_err());
        assert!(NonlinearRankSelection::with_q(1.0).is_err());
        assert!(TournamentSelection::new(0).is_err());
    }

    #[test]
    fn roulette_handles_negative_and_constant_fitness() {
        let (pop, _) = population();
        let mut rng = GaRng::from_seed(4);
        let s = RouletteSelection::new();
        let out =
            Selection::<Binary>::select(&s, &pop, &[-3.0, -2.0, -1.0, -0.5], &mut rng).unwrap();
        assert_eq!(out.parents.len(), 4);
        let out = Selection::<Binary>::select(&s, &pop, &[2.0, 2.0, 2.0, 2.0], &mut rng).unwrap();
        assert_eq!(out.parents.len(), 4);
    }
}
