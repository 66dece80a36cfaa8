use genoptim::encoding::RealValued;
use genoptim::evolution::Ga;
use genoptim::fitness::FnFitness;
use genoptim::local_search::LocalSearchOptions;

/// `-(|x| + cos x)`, maximized at `x = 0` with value `-1`.
fn concave_vee(x: &[f64]) -> f64 {
    -(x[0].abs() + x[0].cos())
}

fn rastrigin2(x: &[f64]) -> f64 {
    let (x1, x2) = (x[0], x[1]);
    -(20.0 + x1 * x1 + x2 * x2
        - 10.0 * ((2.0 * std::f64::consts::PI * x1).cos() + (2.0 * std::f64::consts::PI * x2).cos()))
}

#[test]
fn one_dimensional_concave_converges_to_the_origin() {
    let result = Ga::builder()
        .encoding(RealValued::new(vec![-20.0], vec![20.0]).unwrap())
        .fitness(FnFitness(concave_vee))
        .pop_size(50)
        .maxiter(200)
        .seed(42)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(
        result.solution[0][0].abs() < 1e-2,
        "best x = {}",
        result.solution[0][0]
    );
    assert!(result.fitness_value > -1.01);
}

#[test]
fn rastrigin_without_local_search_gets_close() {
    let result = Ga::builder()
        .encoding(RealValued::new(vec![-5.12, -5.12], vec![5.12, 5.12]).unwrap())
        .fitness(FnFitness(rastrigin2))
        .pop_size(50)
        .maxiter(100)
        .seed(123)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(
        result.fitness_value > -5.0,
        "best fitness = {}",
        result.fitness_value
    );
}

#[test]
fn rastrigin_with_local_search_reaches_the_global_basin() {
    let result = Ga::builder()
        .encoding(RealValued::new(vec![-5.12, -5.12], vec![5.12, 5.12]).unwrap())
        .fitness(FnFitness(rastrigin2))
        .pop_size(50)
        .maxiter(100)
        .seed(123)
        // Refine often and from the fittest rows, so the simplex search
        // polishes whichever basin the population has found.
        .local_search(LocalSearchOptions {
            poptim: 0.4,
            pressel: 0.9,
            maxit: 300,
        })
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(
        result.fitness_value > -1.0,
        "best fitness = {}",
        result.fitness_value
    );
    // The refined rows still respect the box.
    for row in &result.population {
        assert!(row.iter().all(|v| (-5.12..=5.12).contains(v)));
    }
}

#[test]
fn local_search_settings_are_validated_up_front() {
    let err = Ga::builder()
        .encoding(RealValued::new(vec![-1.0], vec![1.0]).unwrap())
        .fitness(FnFitness(|x: &[f64]| -x[0] * x[0]))
        .local_search(LocalSearchOptions {
            poptim: 1.5,
            ..LocalSearchOptions::default()
        })
        .build()
        .map(|_| ())
        .unwrap_err();
    assert!(err.to_string().contains("poptim"));
}

#[test]
fn suggestions_outside_the_box_are_rejected() {
    let err = Ga::builder()
        .encoding(RealValued::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap())
        .fitness(FnFitness(|x: &[f64]| -x[0] * x[0]))
        .suggestions(vec![vec![0.5, 3.0]])
        .build()
        .unwrap()
        .run()
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, genoptim::GaError::ShapeMismatch(_)));
}

#[test]
fn partially_non_finite_fitness_is_survivable() {
    // Score is undefined on half the domain; those rows go missing but
    // the run continues on the finite half.
    let spiky = |x: &[f64]| {
        if x[0] < 0.0 {
            f64::NAN
        } else {
            -x[0]
        }
    };
    let result = Ga::builder()
        .encoding(RealValued::new(vec![-1.0], vec![1.0]).unwrap())
        .fitness(FnFitness(spiky))
        .pop_size(30)
        .maxiter(50)
        .seed(7)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(result.fitness_value >= -1.0);
    assert!(result.fitness_value <= 0.0);
    assert!(result.solution.iter().all(|row| row[0] >= 0.0));
}
