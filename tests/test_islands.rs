use genoptim::encoding::{Binary, RealValued};
use genoptim::evolution::{Ga, IslandOptions};
use genoptim::fitness::{FnFitness, Parallelism};

fn rastrigin2(x: &[f64]) -> f64 {
    let (x1, x2) = (x[0], x[1]);
    -(20.0 + x1 * x1 + x2 * x2
        - 10.0 * ((2.0 * std::f64::consts::PI * x1).cos() + (2.0 * std::f64::consts::PI * x2).cos()))
}

fn rastrigin_islands(parallel: Parallelism) -> genoptim::evolution::IslandGaResult<RealValued> {
    Ga::builder()
        .encoding(RealValued::new(vec![-5.12, -5.12], vec![5.12, 5.12]).unwrap())
        .fitness(FnFitness(rastrigin2))
        .pop_size(50)
        .maxiter(60)
        .seed(7)
        .parallel(parallel)
        .build_islands(IslandOptions {
            num_islands: 4,
            migration_rate: 0.10,
            migration_interval: 5,
        })
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn island_runs_are_bit_identical_serial_vs_pool() {
    let serial = rastrigin_islands(Parallelism::Off);
    let pooled = rastrigin_islands(Parallelism::Threads(4));

    assert_eq!(serial.fitness_value, pooled.fitness_value);
    assert_eq!(serial.solution, pooled.solution);
    assert_eq!(serial.epoch, pooled.epoch);
    for (a, b) in serial.islands.iter().zip(&pooled.islands) {
        assert_eq!(a.population, b.population);
        assert_eq!(a.fitness, b.fitness);
        assert_eq!(a.fitness_value, b.fitness_value);
    }
}

#[test]
fn islands_make_progress_on_rastrigin() {
    let result = rastrigin_islands(Parallelism::Off);
    assert!(result.fitness_value > -5.0);
    assert_eq!(result.iter, result.epoch * 5);
    for island in &result.islands {
        // islSize = max(10, 50 / 4)
        assert_eq!(island.population.len(), 12);
        assert_eq!(island.summary.len(), result.iter);
    }
}

#[test]
fn migration_spreads_good_rows_around_the_ring() {
    // One island is seeded with the optimum; after a few epochs every
    // island has seen it. Variation is disabled so the row can only
    // spread through migration.
    let optimum = vec![1u8; 8];
    let result = Ga::builder()
        .encoding(Binary::new(8))
        .fitness(FnFitness(|g: &[u8]| g.iter().map(|&b| b as f64).sum()))
        .pop_size(40)
        .pcrossover(0.0)
        .pmutation(0.0)
        .elitism(1)
        .maxiter(50)
        .seed(3)
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
        assert_eq!(island.fitness_value, 8.0);
    }
    assert_eq!(result.fitness_value, 8.0);
}

#[test]
fn all_islands_converging_stops_the_archipelago() {
    let result = Ga::builder()
        .encoding(Binary::new(6))
        .fitness(FnFitness(|g: &[u8]| g.iter().map(|&b| b as f64).sum()))
        .pop_size(40)
        .maxiter(1000)
        .max_fitness(6.0)
        .seed(11)
        .build_islands(IslandOptions {
            num_islands: 4,
            migration_rate: 0.1,
            migration_interval: 5,
        })
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.fitness_value, 6.0);
    assert!(result.epoch < 200, "stopped in {} epochs", result.epoch);
    for island in &result.islands {
        assert!(island.fitness_value >= 6.0);
    }
}
