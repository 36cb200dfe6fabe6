// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! trellis-core: lattice kinetic Monte Carlo simulation engine.
//!
//! The engine advances a periodic lattice of typed species in continuous
//! time with the variable-step-size (BKL / n-fold-way) algorithm: every
//! elementary process keeps the exact set of sites where it currently
//! matches, a `(process, site)` pair is drawn in proportion to rate, the
//! local rewrite is applied, and only the affected neighbourhoods are
//! re-evaluated. Optional pieces plug in at fixed seams: a per-event rate
//! calculator, trajectory sinks, analysis plugins, and periodic
//! redistribution of fast species.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names,
    clippy::module_name_repetitions
)]

mod config;
mod control;
mod distributor;
mod error;
mod interactions;
mod lattice_map;
mod matchlist;
mod model;
mod plugin;
mod prng;
mod process;
mod rate;
mod rate_tree;
mod sitesmap;
mod species;
mod timer;
mod trajectory;

// Re-exports for a stable public API.
/// The mutable configuration: per-site species and atom identities.
pub use config::Configuration;
/// Control parameters and the analysis/trajectory cadence types.
pub use control::{
    AnalysisInterval, ControlParameters, ControlParametersBuilder, DistributorKind,
    ExtraTrajWindow, IntervalSpec, SlowIndicesFn,
};
/// Every failure the core reports.
pub use error::Error;
/// The interactions arena: processes, selection, re-evaluation.
pub use interactions::Interactions;
/// The (cell, basis) ↔ global index map.
pub use lattice_map::{CellOffset, LatticeMap, SiteAddress};
/// Process specifications and compiled match-list entries.
pub use matchlist::{MatchEntry, ProcessSpec, ProcessSpecBuilder};
/// The driver owning the step loop.
pub use model::LatticeModel;
/// The analysis plugin seam.
pub use plugin::AnalysisPlugin;
/// Seedable generators behind the deterministic draw stream.
pub use prng::{RngKind, SimRng};
/// Compiled processes and their available-site sets.
pub use process::{AvailableSites, Process};
/// The pluggable rate model.
pub use rate::{RateCalculator, RateContext, RateModel};
/// The static per-site site types.
pub use sitesmap::SitesMap;
/// Interned type names with dense codes.
pub use species::{TypeRegistry, WILDCARD, WILDCARD_CODE};
/// Continuous simulation time.
pub use timer::SimulationTimer;
/// Trajectory sinks: the lattice and xyz text formats.
pub use trajectory::{LatticeTrajectoryWriter, TrajectorySink, XyzTrajectoryWriter};

// The geometry primitives are part of the public surface; re-export them so
// downstream code does not need a direct trellis-geom dependency.
pub use trellis_geom::{CellVectors, Coordinate, Lattice, COORDINATE_EPS};
