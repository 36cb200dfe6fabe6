// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The pluggable rate model: fixed base rates or a per-event calculator.

use trellis_geom::Coordinate;

use crate::species::TypeRegistry;

/// Everything a rate calculator sees for one `(process, site)` pair.
///
/// Slices are views into the process's match list (truncated to the
/// calculator's cutoff) and the current configuration; nothing here can be
/// used to mutate the simulation.
#[derive(Debug)]
pub struct RateContext<'a> {
    /// Local stencil coordinates, canonical order, fractional units.
    pub coordinates: &'a [Coordinate],
    /// Species codes currently occupying the stencil.
    pub types_before: &'a [u32],
    /// Species codes the process would write (0 leaves a site untouched).
    pub types_after: &'a [u32],
    /// The process's base rate constant.
    pub base_rate: f64,
    /// Id of the process being evaluated.
    pub process_id: usize,
    /// Cartesian coordinate of the center site.
    pub global_coordinate: Coordinate,
    /// Registry to render species codes as names, if the calculator wants
    /// them.
    pub species: &'a TypeRegistry,
}

/// A user-supplied rate calculator.
///
/// Called once per `(process, site)` pair whenever the pair's neighbourhood
/// is (re-)evaluated; it must be observably pure with respect to the core
/// (internal memoization is fine). Returns the effective rate: negative
/// values clamp to zero, non-finite values abort the run.
pub trait RateCalculator {
    /// Effective rate for the given local environment.
    fn rate(&self, ctx: &RateContext<'_>) -> f64;

    /// Neighbourhood radius handed to [`Self::rate`], in fractional units.
    ///
    /// The conventional default `1.0` means "the process's own stencil
    /// extent".
    fn cutoff(&self) -> f64 {
        1.0
    }
}

/// The rate model attached to an interactions object.
///
/// A tagged variant rather than a trait object at the top level: the fixed
/// path stays free of dynamic dispatch on the hot loop, and the custom path
/// pays one vtable call per evaluated pair.
pub enum RateModel {
    /// Every process uses its base rate; site picks are uniform.
    Fixed,
    /// A calculator maps each `(process, site)` pair to an effective rate.
    Custom(Box<dyn RateCalculator>),
}

impl std::fmt::Debug for RateModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => f.write_str("RateModel::Fixed"),
            Self::Custom(_) => f.write_str("RateModel::Custom(..)"),
        }
    }
}

impl RateModel {
    /// `true` when a custom calculator is attached.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// The calculator's cutoff, when one is attached.
    pub fn cutoff(&self) -> Option<f64> {
        match self {
            Self::Fixed => None,
            Self::Custom(calc) => Some(calc.cutoff()),
        }
    }
}
