// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cell vectors: the fractional ↔ cartesian transform.

use crate::coordinate::Coordinate;

/// The three primitive cell vectors as rows of a 3×3 matrix.
///
/// A fractional coordinate `(fa, fb, fc)` maps to cartesian space as
/// `fa·a + fb·b + fc·c`. The transform is applied to both positions and
/// displacements; displacements simply drop the lattice origin term, which is
/// zero here anyway.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellVectors {
    /// First primitive vector.
    pub a: Coordinate,
    /// Second primitive vector.
    pub b: Coordinate,
    /// Third primitive vector.
    pub c: Coordinate,
}

impl CellVectors {
    /// Creates the transform from three primitive vectors.
    pub const fn new(a: Coordinate, b: Coordinate, c: Coordinate) -> Self {
        Self { a, b, c }
    }

    /// The identity transform: fractional and cartesian frames coincide.
    pub const fn unit() -> Self {
        Self {
            a: Coordinate::new(1.0, 0.0, 0.0),
            b: Coordinate::new(0.0, 1.0, 0.0),
            c: Coordinate::new(0.0, 0.0, 1.0),
        }
    }

    /// Transforms a fractional coordinate into the cartesian frame.
    pub fn to_cartesian(&self, fractional: &Coordinate) -> Coordinate {
        self.a
            .scale(fractional.x)
            .add(&self.b.scale(fractional.y))
            .add(&self.c.scale(fractional.z))
    }
}

impl Default for CellVectors {
    fn default() -> Self {
        Self::unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cell_is_identity() {
        let cell = CellVectors::unit();
        let p = Coordinate::new(1.5, -2.0, 0.25);
        assert_eq!(cell.to_cartesian(&p), p);
    }

    #[test]
    fn skewed_cell_transforms_components() {
        let cell = CellVectors::new(
            Coordinate::new(2.0, 0.0, 0.0),
            Coordinate::new(1.0, 1.0, 0.0),
            Coordinate::new(0.0, 0.0, 3.0),
        );
        let p = cell.to_cartesian(&Coordinate::new(1.0, 2.0, 1.0));
        assert_eq!(p, Coordinate::new(4.0, 2.0, 3.0));
    }
}
