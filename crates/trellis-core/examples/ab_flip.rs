// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The canonical two-species flip simulation.
//!
//! A 10×10 periodic sheet starts as all B; `A -> B` runs at rate 1 and
//! `B -> A` at rate 4, so the stationary state holds roughly 80 A. The run
//! writes a lattice-format trajectory next to the working directory and
//! logs progress through `tracing`.

use trellis_core::{
    Configuration, ControlParameters, Error, Interactions, Lattice, LatticeModel,
    LatticeTrajectoryWriter, ProcessSpec, RngKind, SitesMap,
};

fn flip(from: &str, to: &str, rate: f64) -> Result<ProcessSpec, Error> {
    ProcessSpec::builder()
        .coordinates(&[[0.0, 0.0, 0.0]])
        .before(&[from])
        .after(&[to])
        .basis_sites(&[0])
        .rate(rate)
        .build()
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let lattice = Lattice::simple_cubic((10, 10, 1), [true, true, false]);
    let cfg = Configuration::from_types(&lattice, &vec!["B"; 100], Some(&["A", "B"]))?;
    let sites = SitesMap::uniform(&lattice, "bulk")?;
    let interactions = Interactions::new(vec![flip("A", "B", 1.0)?, flip("B", "A", 4.0)?], true);
    let mut model = LatticeModel::new(lattice, cfg, sites, interactions)?;

    let control = ControlParameters::builder()
        .number_of_steps(1000)
        .dump_interval(500)
        .seed(2013)
        .rng_kind(RngKind::Mt)
        .build()?;
    let mut trajectory = LatticeTrajectoryWriter::create("ab_flip_traj.py", model.lattice())?;
    model.run(&control, Some(&mut trajectory), &mut [])?;

    let n_a = model
        .configuration()
        .elements()
        .iter()
        .filter(|e| e.as_str() == "A")
        .count();
    tracing::info!(
        n_a,
        n_b = 100 - n_a,
        time = model.simulation_time(),
        "finished"
    );
    Ok(())
}
