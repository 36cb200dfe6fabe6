// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! trellis-geom: geometry primitives for the trellis lattice kMC engine.
//!
//! This crate is the "frozen geometry provider" consumed by `trellis-core`:
//! fractional coordinates with a fixed comparison tolerance, the 3×3 cell
//! transform, and the periodic lattice description (basis points, cell
//! repetitions, per-axis periodicity). Everything here is immutable once
//! constructed; the simulation kernel only reads it.
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
    clippy::many_single_char_names,
    clippy::module_name_repetitions
)]

mod cell;
mod coordinate;
mod lattice;

/// Cell transform between fractional and cartesian frames.
pub use cell::CellVectors;
/// Fractional/cartesian coordinate triple with tolerance-based equality.
pub use coordinate::{Coordinate, COORDINATE_EPS};
/// Frozen lattice description and construction errors.
pub use lattice::{Lattice, LatticeError};
