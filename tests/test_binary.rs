use std::sync::{Arc, Mutex};

use genoptim::encoding::Binary;
use genoptim::evolution::{Ga, SearchState};
use genoptim::fitness::{FnFitness, Parallelism};

fn ones(genome: &[u8]) -> f64 {
    genome.iter().map(|&b| b as f64).sum()
}

#[test]
fn max_ones_reaches_the_optimum() {
    let result = Ga::builder()
        .encoding(Binary::new(10))
        .fitness(FnFitness(|g: &[u8]| ones(g)))
        .pop_size(20)
        .maxiter(200)
        .seed(1)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.fitness_value, 10.0);
    assert!(result.solution.contains(&vec![1u8; 10]));
    assert!(result.iter <= 200);
}

#[test]
fn elitism_preserves_the_top_three_every_generation() {
    let snapshots: Arc<Mutex<Vec<(Vec<Vec<u8>>, Vec<f64>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);

    Ga::builder()
        .encoding(Binary::new(12))
        .fitness(FnFitness(|g: &[u8]| ones(g)))
        .pop_size(20)
        .elitism(3)
        .maxiter(40)
        .seed(17)
        .monitor(move |state: &SearchState<Binary>| {
            sink.lock()
                .unwrap()
                .push((state.population.clone(), state.fitness.clone()));
        })
        .build()
        .unwrap()
        .run()
        .unwrap();

    let snapshots = snapshots.lock().unwrap();
    assert!(snapshots.len() > 1);
    for window in snapshots.windows(2) {
        let (population, fitness) = &window[0];
        let (next_population, _) = &window[1];
        let mut order: Vec<usize> = (0..population.len()).collect();
        order.sort_by(|&a, &b| fitness[b].partial_cmp(&fitness[a]).unwrap());
        for &i in order.iter().take(3) {
            assert!(
                next_population.contains(&population[i]),
                "top-3 row lost between generations"
            );
        }
    }
}

#[test]
fn no_variation_and_full_elitism_is_a_fixed_point() {
    let suggestions: Vec<Vec<u8>> = (0..20u32)
        .map(|i| (0..10).map(|b| ((i >> (b % 5)) & 1) as u8).collect())
        .collect();

    let result = Ga::builder()
        .encoding(Binary::new(10))
        .fitness(FnFitness(|g: &[u8]| ones(g)))
        .pop_size(20)
        .pcrossover(0.0)
        .pmutation(0.0)
        .elitism(20)
        .maxiter(6)
        .seed(2)
        .suggestions(suggestions.clone())
        .build()
        .unwrap()
        .run()
        .unwrap();

    // The population may be reordered by the elite pass, but as a
    // multiset it never changes.
    let mut expected = suggestions;
    let mut actual = result.population;
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);
    for (genome, fitness) in actual.iter().zip(&result.fitness) {
        assert!(result.fitness.contains(&ones(genome)));
        assert!(fitness.is_finite());
    }
}

#[test]
fn constant_fitness_stops_on_the_run_window() {
    let result = Ga::builder()
        .encoding(Binary::new(8))
        .fitness(FnFitness(|_: &[u8]| 1.0))
        .pop_size(15)
        .maxiter(100)
        .run_window(5)
        .seed(8)
        .build()
        .unwrap()
        .run()
        .unwrap();

    // The first generation improves from -inf; the counter then climbs
    // one per generation and fires after `run` flat generations.
    assert_eq!(result.iter, 6);
    assert_eq!(result.fitness_value, 1.0);
}

#[test]
fn target_fitness_stops_the_run_promptly() {
    let result = Ga::builder()
        .encoding(Binary::new(10))
        .fitness(FnFitness(|g: &[u8]| ones(g)))
        .pop_size(30)
        .maxiter(500)
        .max_fitness(10.0)
        .seed(21)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.fitness_value, 10.0);
    assert!(result.iter < 500, "should stop well before the ceiling");
    // The stop fires at the generation that attains the target.
    assert_eq!(result.summary.last().unwrap().max, 10.0);
}

#[test]
fn serial_and_parallel_runs_are_bit_identical() {
    let build = |parallel: Parallelism| {
        Ga::builder()
            .encoding(Binary::new(16))
            .fitness(FnFitness(|g: &[u8]| ones(g)))
            .pop_size(24)
            .maxiter(60)
            .seed(33)
            .parallel(parallel)
            .build()
            .unwrap()
            .run()
            .unwrap()
    };

    let serial = build(Parallelism::Off);
    let pooled = build(Parallelism::Threads(3));

    assert_eq!(serial.fitness_value, pooled.fitness_value);
    assert_eq!(serial.solution, pooled.solution);
    assert_eq!(serial.population, pooled.population);
    assert_eq!(serial.iter, pooled.iter);
}

#[test]
fn keep_best_records_one_snapshot_per_generation() {
    let result = Ga::builder()
        .encoding(Binary::new(8))
        .fitness(FnFitness(|g: &[u8]| ones(g)))
        .pop_size(15)
        .maxiter(25)
        .seed(5)
        .keep_best(true)
        .build()
        .unwrap()
        .run()
        .unwrap();

    let history = result.best_history.expect("keep_best was enabled");
    assert_eq!(history.len(), result.iter);
    assert!(history.iter().all(|snapshot| !snapshot.is_empty()));
}

#[test]
fn population_size_and_domain_hold_at_every_boundary() {
    let checks: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&checks);
    let encoding = Binary::new(10);
    let domain_check = encoding.clone();

    Ga::builder()
        .encoding(encoding)
        .fitness(FnFitness(|g: &[u8]| ones(g)))
        .pop_size(20)
        .maxiter(30)
        .seed(12)
        .monitor(move |state: &SearchState<Binary>| {
            use genoptim::encoding::Encoding;
            let ok = state.population.len() == 20
                && state.fitness.len() == 20
                && state.population.iter().all(|g| domain_check.is_valid(g));
            sink.lock().unwrap().push(ok);
        })
        .build()
        .unwrap()
        .run()
        .unwrap();

    let checks = checks.lock().unwrap();
    assert!(!checks.is_empty());
    assert!(checks.iter().all(|&ok| ok));
}
