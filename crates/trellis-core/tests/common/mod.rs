// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for the integration tests: the two-species flip model
//! and small helper plugins.
#![allow(dead_code)]

use trellis_core::{
    Configuration, ControlParameters, Interactions, Lattice, LatticeModel, ProcessSpec,
    RngKind, SitesMap,
};

/// Single-site species flip `from -> to` at basis 0.
pub fn flip_spec(from: &str, to: &str, rate: f64) -> ProcessSpec {
    ProcessSpec::builder()
        .coordinates(&[[0.0, 0.0, 0.0]])
        .before(&[from])
        .after(&[to])
        .basis_sites(&[0])
        .rate(rate)
        .build()
        .expect("flip spec")
}

/// Nearest-neighbour swap `[center, +x] : [a, b] -> [b, a]` at basis 0.
pub fn swap_spec(a: &str, b: &str, rate: f64) -> ProcessSpec {
    ProcessSpec::builder()
        .coordinates(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])
        .before(&[a, b])
        .after(&[b, a])
        .basis_sites(&[0])
        .rate(rate)
        .build()
        .expect("swap spec")
}

/// The AB-flip model: an `na × nb × 1` periodic sheet, every site starting
/// as `initial`, with `A -> B` at `rate_ab` and `B -> A` at `rate_ba`.
pub fn ab_flip_model(
    na: usize,
    nb: usize,
    rate_ab: f64,
    rate_ba: f64,
    initial: &str,
) -> LatticeModel {
    let lattice = Lattice::simple_cubic((na, nb, 1), [true, true, false]);
    let types = vec![initial; na * nb];
    let cfg = Configuration::from_types(&lattice, &types, Some(&["A", "B"]))
        .expect("configuration");
    let sites = SitesMap::uniform(&lattice, "bulk").expect("sites map");
    let interactions = Interactions::new(
        vec![flip_spec("A", "B", rate_ab), flip_spec("B", "A", rate_ba)],
        true,
    );
    LatticeModel::new(lattice, cfg, sites, interactions).expect("model")
}

/// Control parameters for a fixed-seed Mersenne-Twister run.
pub fn mt_run(steps: u64, seed: u64, dump_interval: u64) -> ControlParameters {
    ControlParameters::builder()
        .number_of_steps(steps)
        .dump_interval(dump_interval)
        .seed(seed)
        .rng_kind(RngKind::Mt)
        .build()
        .expect("control parameters")
}

/// Counts species occurrences in a configuration snapshot.
pub fn count_species(cfg: &Configuration, name: &str) -> usize {
    cfg.elements().iter().filter(|e| e.as_str() == name).count()
}
