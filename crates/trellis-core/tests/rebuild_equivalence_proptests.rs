// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests: the incrementally maintained matching state equals a
//! fresh rebuild for arbitrary initial configurations and seeds.

mod common;

use common::{flip_spec, swap_spec};
use proptest::prelude::*;
use trellis_core::{
    Configuration, ControlParameters, Interactions, Lattice, LatticeModel, ProcessSpec,
    SitesMap,
};

fn specs() -> Vec<ProcessSpec> {
    vec![
        flip_spec("A", "B", 1.0),
        flip_spec("B", "A", 3.0),
        swap_spec("A", "V", 0.7),
        swap_spec("V", "A", 0.7),
    ]
}

fn model_from(types: &[&str], steps: u64, seed: u64) -> LatticeModel {
    let lattice = Lattice::simple_cubic((4, 4, 1), [true, true, false]);
    let cfg = Configuration::from_types(&lattice, types, Some(&["A", "B", "V"]))
        .expect("configuration");
    let sites = SitesMap::uniform(&lattice, "bulk").expect("sites");
    let mut model = LatticeModel::new(lattice, cfg, sites, Interactions::new(specs(), true))
        .expect("model");
    if steps > 0 {
        let control = ControlParameters::builder()
            .number_of_steps(steps)
            .dump_interval(steps)
            .seed(seed)
            .build()
            .expect("control");
        // Runs may exhaust every process on hostile configurations; the
        // invariant below holds either way.
        let _ = model.run(&control, None, &mut []);
    }
    model
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn incremental_state_equals_fresh_rebuild(
        species in proptest::collection::vec(0..3usize, 16),
        steps in 1..40u64,
        seed in 1..10_000u64,
    ) {
        let names = ["A", "B", "V"];
        let types: Vec<&str> = species.iter().map(|&s| names[s]).collect();
        let model = model_from(&types, steps, seed);

        let fresh = LatticeModel::new(
            Lattice::simple_cubic((4, 4, 1), [true, true, false]),
            model.configuration().clone(),
            SitesMap::uniform(model.lattice(), "bulk").expect("sites"),
            Interactions::new(specs(), true),
        )
        .expect("fresh rebuild");

        for (live, rebuilt) in model
            .interactions()
            .processes()
            .iter()
            .zip(fresh.interactions().processes())
        {
            let mut a: Vec<usize> = live.available().as_slice().to_vec();
            let mut b: Vec<usize> = rebuilt.available().as_slice().to_vec();
            a.sort_unstable();
            b.sort_unstable();
            prop_assert_eq!(a, b, "process {} diverged", live.id());
        }
        let drift = (model.interactions().total_rate()
            - fresh.interactions().total_rate())
        .abs();
        prop_assert!(drift < 1.0e-9, "total rate drift {}", drift);
    }

    #[test]
    fn species_population_is_conserved_by_swaps(
        seed in 1..10_000u64,
        steps in 1..60u64,
    ) {
        // Only swap processes: every species count is invariant.
        let lattice = Lattice::simple_cubic((4, 4, 1), [true, true, false]);
        let mut types = vec!["V"; 16];
        for g in [1, 5, 6, 11] {
            types[g] = "A";
        }
        let cfg = Configuration::from_types(&lattice, &types, Some(&["A", "V"]))
            .expect("configuration");
        let sites = SitesMap::uniform(&lattice, "bulk").expect("sites");
        let swap_only = vec![swap_spec("A", "V", 1.0), swap_spec("V", "A", 1.0)];
        let mut model =
            LatticeModel::new(lattice, cfg, sites, Interactions::new(swap_only, true))
                .expect("model");
        let control = ControlParameters::builder()
            .number_of_steps(steps)
            .dump_interval(steps)
            .seed(seed)
            .build()
            .expect("control");
        model.run(&control, None, &mut []).expect("run");

        let elements = model.configuration().elements();
        let n_a = elements.iter().filter(|e| e.as_str() == "A").count();
        prop_assert_eq!(n_a, 4);

        // Atom identities survive as a permutation.
        let mut ids: Vec<u32> = (0..16).map(|g| model.configuration().atom_id_at(g)).collect();
        ids.sort_unstable();
        let expected: Vec<u32> = (0..16).collect();
        prop_assert_eq!(ids, expected);
    }
}
