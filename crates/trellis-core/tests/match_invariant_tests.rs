// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The match invariant, audited live during a run.
//!
//! For every process P and every site g: g is in P's available set exactly
//! when the stencil walk at g succeeds. A plugin re-derives the full
//! matching from scratch after every step and compares it with the
//! incrementally maintained state, including the total rate.

mod common;

use common::{flip_spec, mt_run, swap_spec};
use trellis_core::{
    AnalysisPlugin, Configuration, Error, Interactions, Lattice, LatticeMap, LatticeModel,
    ProcessSpec, SitesMap,
};

struct MatchAudit {
    lattice: Lattice,
    sites: SitesMap,
    map: LatticeMap,
    specs: Vec<ProcessSpec>,
}

impl MatchAudit {
    fn new(lattice: &Lattice, sites: &SitesMap, specs: Vec<ProcessSpec>) -> Self {
        Self {
            lattice: lattice.clone(),
            sites: sites.clone(),
            map: LatticeMap::new(
                lattice.repetitions(),
                lattice.n_basis(),
                lattice.periodicity(),
            ),
            specs,
        }
    }

    fn audit(&self, cfg: &Configuration, interactions: &Interactions) {
        let mut buf = Vec::new();
        let mut pair_count = 0usize;
        for process in interactions.processes() {
            for gidx in 0..self.map.n_sites() {
                let matches =
                    process.matches_at(gidx, cfg, &self.sites, &self.map, &mut buf);
                assert_eq!(
                    matches,
                    process.available().contains(gidx),
                    "match invariant broken for process {} at site {gidx}",
                    process.id()
                );
                pair_count += usize::from(matches);
            }
        }
        assert_eq!(
            pair_count,
            interactions.total_available_sites(),
            "sum of available-set sizes disagrees with a full matching scan"
        );

        // A fresh build from the current configuration must agree with the
        // incrementally maintained state.
        let fresh = LatticeModel::new(
            self.lattice.clone(),
            cfg.clone(),
            self.sites.clone(),
            Interactions::new(self.specs.clone(), interactions.implicit_wildcards()),
        )
        .expect("fresh rebuild");
        for (live, rebuilt) in interactions
            .processes()
            .iter()
            .zip(fresh.interactions().processes())
        {
            let mut a: Vec<usize> = live.available().as_slice().to_vec();
            let mut b: Vec<usize> = rebuilt.available().as_slice().to_vec();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b, "available set of process {} diverged", live.id());
        }
        let drift =
            (interactions.total_rate() - fresh.interactions().total_rate()).abs();
        assert!(
            drift < 1.0e-9,
            "total rate drifted {drift} from a fresh rebuild"
        );
    }
}

impl AnalysisPlugin for MatchAudit {
    fn setup(
        &mut self,
        _step: u64,
        _time: f64,
        cfg: &Configuration,
        interactions: &Interactions,
    ) -> Result<(), Error> {
        self.audit(cfg, interactions);
        Ok(())
    }

    fn register_step(
        &mut self,
        _step: u64,
        _time: f64,
        cfg: &Configuration,
        interactions: &Interactions,
    ) -> Result<(), Error> {
        self.audit(cfg, interactions);
        Ok(())
    }
}

fn checkerboard(n: usize) -> Vec<&'static str> {
    (0..n * n)
        .map(|g| {
            let (a, b) = (g / n, g % n);
            if (a + b) % 2 == 0 {
                "A"
            } else {
                "B"
            }
        })
        .collect()
}

#[test]
fn incremental_matching_agrees_with_full_rebuild_every_step() {
    let lattice = Lattice::simple_cubic((6, 6, 1), [true, true, false]);
    let cfg = Configuration::from_types(&lattice, &checkerboard(6), Some(&["A", "B"]))
        .expect("configuration");
    let sites = SitesMap::uniform(&lattice, "bulk").expect("sites");
    let specs = vec![
        flip_spec("A", "B", 1.0),
        flip_spec("B", "A", 2.0),
        swap_spec("A", "B", 0.5),
    ];
    let mut model = LatticeModel::new(
        lattice.clone(),
        cfg,
        sites.clone(),
        Interactions::new(specs.clone(), true),
    )
    .expect("model");

    let mut plugins: Vec<Box<dyn AnalysisPlugin>> =
        vec![Box::new(MatchAudit::new(&lattice, &sites, specs))];
    model
        .run(&mt_run(60, 2013, 60), None, &mut plugins)
        .expect("run");
}

#[test]
fn swap_moves_keep_the_invariant_without_wildcard_padding() {
    let lattice = Lattice::simple_cubic((5, 5, 1), [true, true, false]);
    let cfg = Configuration::from_types(&lattice, &checkerboard(5), Some(&["A", "B"]))
        .expect("configuration");
    let sites = SitesMap::uniform(&lattice, "bulk").expect("sites");
    let specs = vec![swap_spec("A", "B", 1.0), swap_spec("B", "A", 1.0)];
    let mut model = LatticeModel::new(
        lattice.clone(),
        cfg,
        sites.clone(),
        Interactions::new(specs.clone(), false),
    )
    .expect("model");

    let mut plugins: Vec<Box<dyn AnalysisPlugin>> =
        vec![Box::new(MatchAudit::new(&lattice, &sites, specs))];
    model
        .run(&mt_run(40, 17, 40), None, &mut plugins)
        .expect("run");
}
