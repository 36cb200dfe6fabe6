// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Statistical behaviour of the two-species flip model.
//!
//! With `A -> B` at rate 1 and `B -> A` at rate 4, detailed balance puts the
//! stationary A fraction at 4/5. These tests assert loose stochastic bounds,
//! not exact trajectories; the exact-reproducibility guarantees live in the
//! determinism tests.

mod common;

use common::{ab_flip_model, count_species, mt_run};
use trellis_core::{AnalysisPlugin, Configuration, Error, Interactions};

#[test]
fn all_b_start_relaxes_to_four_fifths_a() {
    let mut model = ab_flip_model(10, 10, 1.0, 4.0, "B");
    assert_eq!(count_species(model.configuration(), "B"), 100);
    assert_eq!(count_species(model.configuration(), "A"), 0);

    model
        .run(&mt_run(1000, 2013, 500), None, &mut [])
        .expect("run");

    // Stationary mean 80 A, fluctuation scale sqrt(100 · 0.8 · 0.2) = 4.
    let n_a = count_species(model.configuration(), "A");
    assert!(
        (60..=95).contains(&n_a),
        "A count {n_a} far from the stationary value 80"
    );
    assert_eq!(count_species(model.configuration(), "B"), 100 - n_a);
}

#[test]
fn time_is_monotone_and_steps_advance_it() {
    struct TimeAudit {
        last_time: f64,
    }
    impl AnalysisPlugin for TimeAudit {
        fn register_step(
            &mut self,
            _step: u64,
            time: f64,
            _cfg: &Configuration,
            _interactions: &Interactions,
        ) -> Result<(), Error> {
            assert!(
                time > self.last_time,
                "time went backwards: {} after {}",
                time,
                self.last_time
            );
            self.last_time = time;
            Ok(())
        }
    }

    let mut model = ab_flip_model(4, 4, 1.0, 1.0, "B");
    let mut plugins: Vec<Box<dyn AnalysisPlugin>> =
        vec![Box::new(TimeAudit { last_time: 0.0 })];
    model
        .run(&mt_run(200, 7, 100), None, &mut plugins)
        .expect("run");
    assert!(model.simulation_time() > 0.0);
}

#[test]
fn zero_steps_do_no_work() {
    let mut model = ab_flip_model(4, 4, 1.0, 1.0, "B");
    let digest = model.configuration().state_digest();
    model.run(&mt_run(0, 1, 1), None, &mut []).expect("run");
    assert_eq!(model.configuration().state_digest(), digest);
    assert!(model.simulation_time().abs() < f64::EPSILON);
}

#[test]
fn exhausted_processes_fail_with_no_available_process() {
    // Only A -> B defined: once everything is B the total rate is zero and
    // the next step must fail, naming the step it happened at.
    let lattice = trellis_core::Lattice::simple_cubic((2, 2, 1), [true, true, false]);
    let cfg = Configuration::from_types(&lattice, &["A"; 4], Some(&["A", "B"]))
        .expect("configuration");
    let sites = trellis_core::SitesMap::uniform(&lattice, "bulk").expect("sites");
    let interactions = Interactions::new(vec![common::flip_spec("A", "B", 1.0)], true);
    let mut model =
        trellis_core::LatticeModel::new(lattice, cfg, sites, interactions).expect("model");

    // Four flips empty the available set; the step whose move zeroed the
    // total rate is the one named.
    let err = model.run(&mt_run(100, 1, 100), None, &mut []).unwrap_err();
    match err {
        Error::NoAvailableProcess { step } => assert_eq!(step, 4),
        other => panic!("expected NoAvailableProcess, got {other:?}"),
    }
}

#[test]
fn time_limit_stops_the_loop_early() {
    let mut model = ab_flip_model(4, 4, 1.0, 1.0, "B");
    let control = trellis_core::ControlParameters::builder()
        .number_of_steps(1_000_000)
        .time_limit(1.0)
        .dump_interval(1_000_000)
        .seed(2013)
        .build()
        .expect("control");
    model.run(&control, None, &mut []).expect("run");
    assert!(model.simulation_time() > 1.0);
    // One step past the limit at most: with 16 sites at rate 1 the mean δt
    // is 1/16, so the overshoot stays small.
    assert!(model.simulation_time() < 3.0);
}
