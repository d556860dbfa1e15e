use alea_markov::{
    EstimatorConfig, MarkovError, MarkovSampler, Message, Output, Receiver, RowFit,
    SamplerConfig, SecondOrderEstimator, TransitionEstimator, TransitionMatrix,
};
use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Asserts that every row is a probability distribution.
fn assert_row_stochastic(tm: &TransitionMatrix) {
    for (i, row) in tm.rows().enumerate() {
        for &p in row {
            assert!((0.0..=1.0).contains(&p), "row {i}: entry {p} outside [0, 1]");
        }
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "row {i} sums to {sum}");
    }
}

/// Random walk over `n_symbols` symbols (with repeats) of length `len`.
fn random_stream(n_symbols: i64, len: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(0..n_symbols)).collect()
}

// ---------------------------------------------------------------------------
// 1. known_sequence_matrix
// ---------------------------------------------------------------------------
#[test]
fn known_sequence_matrix() {
    let mut est = TransitionEstimator::new();
    est.record_all([1, 2, 1, 3, 1, 2]);

    assert_eq!(est.symbols(), &[1, 2, 3]);
    assert_eq!(est.count(1, 2), 2);
    assert_eq!(est.count(1, 3), 1);
    assert_eq!(est.count(2, 1), 1);
    assert_eq!(est.count(3, 1), 1);
    assert_eq!(est.transitions().count(), 4);

    let tm = est.build_matrix();
    let expected = [
        [0.0, 2.0 / 3.0, 1.0 / 3.0],
        [1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
    ];
    for (i, row) in expected.iter().enumerate() {
        for (j, &want) in row.iter().enumerate() {
            assert_abs_diff_eq!(tm.prob(i, j), want, epsilon = 1e-12);
        }
    }
}

// ---------------------------------------------------------------------------
// 2. cleared_estimator_emits_nothing
// ---------------------------------------------------------------------------
#[test]
fn cleared_estimator_emits_nothing() {
    let mut est = TransitionEstimator::new();
    est.receive(&Message::bare("clear"));
    assert!(est.receive(&Message::bare("bang")).is_empty());
}

// ---------------------------------------------------------------------------
// 3. uniform_two_state_frequencies
// ---------------------------------------------------------------------------
#[test]
fn uniform_two_state_frequencies() {
    let mut s = MarkovSampler::new();
    s.resize(2).unwrap();
    assert_eq!(s.matrix().to_rows(), vec![vec![0.5, 0.5], vec![0.5, 0.5]]);
    s.set_state(1).unwrap();
    s.seed(42);

    let states = s.sample_n(1000).unwrap();
    let ones = states.iter().filter(|&&k| k == 1).count();
    let freq = ones as f64 / states.len() as f64;
    assert!((freq - 0.5).abs() < 0.05, "state 1 frequency: {freq}");
}

// ---------------------------------------------------------------------------
// 4. unnormalized_row_rescaled
// ---------------------------------------------------------------------------
#[test]
fn unnormalized_row_rescaled() {
    let mut s = MarkovSampler::with_seed(0);
    s.resize(3).unwrap();
    let fit = s.set_row(1, &[0.2, 0.3, 0.6]).unwrap();
    assert!(matches!(fit, RowFit::Rescaled { .. }));

    let row = s.matrix().row(0);
    assert_abs_diff_eq!(row[0], 0.2 / 1.1, epsilon = 1e-12);
    assert_abs_diff_eq!(row[1], 0.3 / 1.1, epsilon = 1e-12);
    assert_abs_diff_eq!(row[2], 0.6 / 1.1, epsilon = 1e-12);
    assert_row_stochastic(s.matrix());
}

// ---------------------------------------------------------------------------
// 5. out_of_range_state_rejected
// ---------------------------------------------------------------------------
#[test]
fn out_of_range_state_rejected() {
    let mut s = MarkovSampler::with_seed(0);
    s.resize(3).unwrap();
    s.set_state(2).unwrap();
    assert!(matches!(
        s.set_state(5),
        Err(MarkovError::StateOutOfRange { state: 5, n: 3 })
    ));
    assert_eq!(s.current_state().unwrap(), 2);
}

// ---------------------------------------------------------------------------
// 6. capacity_drops_new_symbols
// ---------------------------------------------------------------------------
#[test]
fn capacity_drops_new_symbols() {
    let config = EstimatorConfig::new().with_max_items(2);
    let mut est = TransitionEstimator::from_config(&config).unwrap();
    let dropped = est.record_all([1, 2, 3]);

    assert_eq!(dropped, 1);
    assert_eq!(est.symbols(), &[1, 2]);
    assert_eq!(est.count(2, 3), 0);
    assert_eq!(est.build_matrix().n_states(), 2);
}

// ---------------------------------------------------------------------------
// 7. capacity_bound_holds_for_long_streams
// ---------------------------------------------------------------------------
#[test]
fn capacity_bound_holds_for_long_streams() {
    let max_items = 5;
    let config = EstimatorConfig::new().with_max_items(max_items);
    let mut est = TransitionEstimator::from_config(&config).unwrap();
    est.record_all(random_stream(50, 2000, 8));

    assert_eq!(est.size(), max_items);
    let registered = est.symbols().to_vec();
    for (t, _) in est.transitions() {
        assert!(registered.contains(&t.from) && registered.contains(&t.to));
    }
}

// ---------------------------------------------------------------------------
// 8. derived_matrices_are_row_stochastic
// ---------------------------------------------------------------------------
#[test]
fn derived_matrices_are_row_stochastic() {
    for seed in 0..20 {
        let mut est = TransitionEstimator::new();
        est.record_all(random_stream(8, 50, seed));
        assert_row_stochastic(&est.build_matrix());
        assert!(est.build_matrix().validate().is_ok());
    }
}

// ---------------------------------------------------------------------------
// 9. identical_seeds_identical_trajectories
// ---------------------------------------------------------------------------
#[test]
fn identical_seeds_identical_trajectories() {
    let tm = TransitionMatrix::from_rows(&[[0.1, 0.6, 0.3], [0.3, 0.3, 0.4], [0.5, 0.25, 0.25]])
        .unwrap();

    let mut a = MarkovSampler::with_seed(2024);
    let mut b = MarkovSampler::with_seed(2024);
    a.load_matrix(tm.clone()).unwrap();
    b.load_matrix(tm).unwrap();

    assert_eq!(a.sample_n(500).unwrap(), b.sample_n(500).unwrap());
}

// ---------------------------------------------------------------------------
// 10. sampling_stays_in_domain
// ---------------------------------------------------------------------------
#[test]
fn sampling_stays_in_domain() {
    let mut est = TransitionEstimator::new();
    est.record_all(random_stream(6, 300, 3));
    let tm = est.build_matrix();
    let n = tm.n_states();

    let mut s = MarkovSampler::with_seed(5);
    s.load_matrix(tm).unwrap();
    for k in s.sample_n(5000).unwrap() {
        assert!((1..=n).contains(&k), "state {k} outside 1..={n}");
    }
}

// ---------------------------------------------------------------------------
// 11. estimate_simulate_estimate
// ---------------------------------------------------------------------------
#[test]
fn estimate_simulate_estimate() {
    let truth = TransitionMatrix::from_rows(&[[0.7, 0.2, 0.1], [0.3, 0.4, 0.3], [0.2, 0.2, 0.6]])
        .unwrap();
    let mut s = MarkovSampler::from_config(&SamplerConfig::new().with_seed(99).with_n_states(3))
        .unwrap();
    s.load_matrix(truth.clone()).unwrap();

    let mut est = TransitionEstimator::new();
    est.record(1);
    for k in s.sample_n(50_000).unwrap() {
        est.record(k as i64);
    }

    // Symbols are registered in first-appearance order; map back to states.
    let tm = est.build_matrix();
    for from in 1..=3i64 {
        let i = est.index_of(from).unwrap();
        for to in 1..=3i64 {
            let j = est.index_of(to).unwrap();
            let want = truth.prob((from - 1) as usize, (to - 1) as usize);
            assert!(
                (tm.prob(i, j) - want).abs() < 0.02,
                "P({from}->{to}): got {}, expected {want}",
                tm.prob(i, j)
            );
        }
    }
}

// ---------------------------------------------------------------------------
// 12. message_pipeline_end_to_end
// ---------------------------------------------------------------------------
#[test]
fn message_pipeline_end_to_end() {
    let mut est = TransitionEstimator::new();
    for line in ["1", "2", "1", "3", "1", "2"] {
        est.receive(&line.parse().unwrap());
    }

    let mut s = MarkovSampler::with_seed(7);
    s.receive(&"size 3".parse().unwrap());
    for out in est.receive(&Message::bare("bang")) {
        let msg = out.to_message().expect("estimator emits rows");
        s.receive(&msg);
    }
    assert_eq!(s.matrix(), &est.build_matrix());

    // State 2 and 3 always return to state 1.
    s.receive(&"2".parse().unwrap());
    assert_eq!(s.receive(&Message::bare("bang")), vec![Output::State(1)]);
}

// ---------------------------------------------------------------------------
// 13. second_order_separates_contexts
// ---------------------------------------------------------------------------
#[test]
fn second_order_separates_contexts() {
    // After 1 the chain goes to 2 or 3 depending on what preceded the 1;
    // a first-order estimate cannot tell, a second-order one can.
    let stream: Vec<i64> = [2, 1, 3, 1].iter().copied().cycle().take(400).collect();

    let mut first = TransitionEstimator::new();
    first.record_all(stream.iter().copied());
    let tm = first.build_matrix();
    let one = first.index_of(1).unwrap();
    assert_abs_diff_eq!(tm.prob(one, first.index_of(3).unwrap()), 0.5, epsilon = 0.01);

    let mut second = SecondOrderEstimator::new();
    second.record_all(stream);
    let pm = second.build_matrix();
    let idx = |s: i64| second.index_of(s).unwrap();
    assert_abs_diff_eq!(pm.prob(idx(2), idx(1), idx(3)), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(pm.prob(idx(3), idx(1), idx(2)), 1.0, epsilon = 1e-12);
    assert!(pm.validate().is_ok());
}
