use genoptim::encoding::{Encoding, Permutation};
use genoptim::evolution::Ga;
use genoptim::fitness::FnFitness;

// Symmetric 5-city distance matrix; city k is genome value k+1.
const DIST: [[f64; 5]; 5] = [
    [0.0, 2.0, 9.0, 10.0, 7.0],
    [2.0, 0.0, 6.0, 4.0, 3.0],
    [9.0, 6.0, 0.0, 8.0, 5.0],
    [10.0, 4.0, 8.0, 0.0, 6.0],
    [7.0, 3.0, 5.0, 6.0, 0.0],
];

fn tour_length(tour: &[i64]) -> f64 {
    let mut total = 0.0;
    for i in 0..tour.len() {
        let from = (tour[i] - 1) as usize;
        let to = (tour[(i + 1) % tour.len()] - 1) as usize;
        total += DIST[from][to];
    }
    total
}

fn brute_force_optimum() -> f64 {
    fn permutations(items: &mut Vec<i64>, k: usize, best: &mut f64) {
        if k == items.len() {
            *best = best.min(tour_length(items));
            return;
        }
        for i in k..items.len() {
            items.swap(k, i);
            permutations(items, k + 1, best);
            items.swap(k, i);
        }
    }
    let mut items: Vec<i64> = (1..=5).collect();
    let mut best = f64::INFINITY;
    permutations(&mut items, 0, &mut best);
    best
}

#[test]
fn five_city_tour_matches_the_brute_force_optimum() {
    let encoding = Permutation::new(1, 5).unwrap();
    let result = Ga::builder()
        .encoding(encoding.clone())
        .fitness(FnFitness(|tour: &[i64]| -tour_length(tour)))
        .pop_size(50)
        .maxiter(100)
        .seed(14)
        .build()
        .unwrap()
        .run()
        .unwrap();

    let optimum = brute_force_optimum();
    assert!(
        (result.fitness_value + optimum).abs() < 1e-9,
        "found {}, optimum {}",
        -result.fitness_value,
        optimum
    );
    for tour in &result.solution {
        assert!(encoding.is_valid(tour));
        assert!((tour_length(tour) - optimum).abs() < 1e-9);
    }
}

#[test]
fn every_generation_holds_valid_permutations() {
    use genoptim::evolution::SearchState;
    use std::sync::{Arc, Mutex};

    let encoding = Permutation::new(1, 12).unwrap();
    let domain_check = encoding.clone();
    let violations: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&violations);

    Ga::builder()
        .encoding(encoding)
        .fitness(FnFitness(|tour: &[i64]| -(tour[0] as f64)))
        .pop_size(25)
        .maxiter(40)
        .seed(19)
        .monitor(move |state: &SearchState<Permutation>| {
            let bad = state
                .population
                .iter()
                .filter(|tour| !domain_check.is_valid(tour))
                .count();
            *sink.lock().unwrap() += bad;
        })
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(*violations.lock().unwrap(), 0);
}

#[test]
fn pmx_override_solves_the_tour_as_well() {
    use genoptim::operators::crossover::PmxCrossover;
    use genoptim::operators::mutation::InsertionMutation;

    let result = Ga::builder()
        .encoding(Permutation::new(1, 5).unwrap())
        .fitness(FnFitness(|tour: &[i64]| -tour_length(tour)))
        .pop_size(50)
        .maxiter(100)
        .seed(14)
        .crossover(PmxCrossover::new())
        .mutation(InsertionMutation::new())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!((result.fitness_value + brute_force_optimum()).abs() < 1e-9);
}
