// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The frozen lattice description.

use thiserror::Error;

use crate::cell::CellVectors;
use crate::coordinate::Coordinate;

/// Errors raised while validating a lattice description.
#[derive(Debug, Error)]
pub enum LatticeError {
    /// The basis must contain at least one point.
    #[error("the lattice basis may not be empty")]
    EmptyBasis,
    /// Every repetition count must be at least one.
    #[error("cell repetitions must all be positive, got ({0}, {1}, {2})")]
    ZeroRepetition(usize, usize, usize),
    /// Basis points are given in fractional cell units and must stay inside
    /// the primitive cell.
    #[error("basis point {index} lies outside the primitive cell: ({x}, {y}, {z})")]
    BasisOutsideCell {
        /// Index of the offending basis point.
        index: usize,
        /// Fractional x component.
        x: f64,
        /// Fractional y component.
        y: f64,
        /// Fractional z component.
        z: f64,
    },
}

/// A periodic lattice: primitive cell, basis points, repetitions, periodicity.
///
/// Immutable after construction. The simulation core derives its index maps
/// and trajectory headers from this; nothing in the core ever writes back.
#[derive(Debug, Clone)]
pub struct Lattice {
    cell: CellVectors,
    basis: Vec<Coordinate>,
    repetitions: (usize, usize, usize),
    periodicity: [bool; 3],
}

impl Lattice {
    /// Validates and freezes a lattice description.
    ///
    /// Basis points are fractional and must lie in `[0, 1)` per component.
    pub fn new(
        cell: CellVectors,
        basis: Vec<Coordinate>,
        repetitions: (usize, usize, usize),
        periodicity: [bool; 3],
    ) -> Result<Self, LatticeError> {
        if basis.is_empty() {
            return Err(LatticeError::EmptyBasis);
        }
        let (na, nb, nc) = repetitions;
        if na == 0 || nb == 0 || nc == 0 {
            return Err(LatticeError::ZeroRepetition(na, nb, nc));
        }
        for (index, p) in basis.iter().enumerate() {
            let inside =
                |v: f64| (0.0..1.0).contains(&v);
            if !(inside(p.x) && inside(p.y) && inside(p.z)) {
                return Err(LatticeError::BasisOutsideCell {
                    index,
                    x: p.x,
                    y: p.y,
                    z: p.z,
                });
            }
        }
        Ok(Self {
            cell,
            basis,
            repetitions,
            periodicity,
        })
    }

    /// Convenience constructor for a primitive cubic lattice with one basis
    /// point at the origin and the identity cell.
    pub fn simple_cubic(
        repetitions: (usize, usize, usize),
        periodicity: [bool; 3],
    ) -> Self {
        // Single origin basis point inside the unit cell; cannot fail.
        Self {
            cell: CellVectors::unit(),
            basis: vec![Coordinate::origin()],
            repetitions,
            periodicity,
        }
    }

    /// The cell transform.
    pub fn cell(&self) -> &CellVectors {
        &self.cell
    }

    /// The basis points in fractional cell units.
    pub fn basis(&self) -> &[Coordinate] {
        &self.basis
    }

    /// Number of basis points per cell.
    pub fn n_basis(&self) -> usize {
        self.basis.len()
    }

    /// Cell repetitions along the three axes.
    pub fn repetitions(&self) -> (usize, usize, usize) {
        self.repetitions
    }

    /// Per-axis periodic boundary flags.
    pub fn periodicity(&self) -> [bool; 3] {
        self.periodicity
    }

    /// Total number of lattice sites.
    pub fn n_sites(&self) -> usize {
        let (na, nb, nc) = self.repetitions;
        na * nb * nc * self.basis.len()
    }

    /// Fractional coordinates of every site, ordered `(a, b, c, i)` with the
    /// basis index `i` fastest.
    pub fn sites(&self) -> Vec<Coordinate> {
        let (na, nb, nc) = self.repetitions;
        let mut out = Vec::with_capacity(self.n_sites());
        for a in 0..na {
            for b in 0..nb {
                for c in 0..nc {
                    let cell = Coordinate::new(a as f64, b as f64, c as f64);
                    for p in &self.basis {
                        out.push(cell.add(p));
                    }
                }
            }
        }
        out
    }

    /// Cartesian coordinates of every site, same ordering as [`Self::sites`].
    pub fn cartesian_sites(&self) -> Vec<Coordinate> {
        self.sites()
            .iter()
            .map(|p| self.cell.to_cartesian(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn site_order_has_basis_fastest() {
        let lattice = Lattice::new(
            CellVectors::unit(),
            vec![Coordinate::origin(), Coordinate::new(0.5, 0.5, 0.0)],
            (2, 1, 1),
            [true, true, true],
        )
        .unwrap();
        let sites = lattice.sites();
        assert_eq!(sites.len(), 4);
        assert_eq!(sites[0], Coordinate::new(0.0, 0.0, 0.0));
        assert_eq!(sites[1], Coordinate::new(0.5, 0.5, 0.0));
        assert_eq!(sites[2], Coordinate::new(1.0, 0.0, 0.0));
        assert_eq!(sites[3], Coordinate::new(1.5, 0.5, 0.0));
    }

    #[test]
    fn rejects_empty_basis_and_zero_repetitions() {
        assert!(matches!(
            Lattice::new(CellVectors::unit(), vec![], (1, 1, 1), [true; 3]),
            Err(LatticeError::EmptyBasis)
        ));
        assert!(matches!(
            Lattice::new(
                CellVectors::unit(),
                vec![Coordinate::origin()],
                (0, 1, 1),
                [true; 3]
            ),
            Err(LatticeError::ZeroRepetition(0, 1, 1))
        ));
    }

    #[test]
    fn rejects_basis_outside_cell() {
        let err = Lattice::new(
            CellVectors::unit(),
            vec![Coordinate::new(1.25, 0.0, 0.0)],
            (1, 1, 1),
            [true; 3],
        );
        assert!(matches!(
            err,
            Err(LatticeError::BasisOutsideCell { index: 0, .. })
        ));
    }

    #[test]
    fn cartesian_sites_apply_cell_transform() {
        let lattice = Lattice::new(
            CellVectors::new(
                Coordinate::new(2.0, 0.0, 0.0),
                Coordinate::new(0.0, 2.0, 0.0),
                Coordinate::new(0.0, 0.0, 2.0),
            ),
            vec![Coordinate::origin()],
            (1, 1, 2),
            [true; 3],
        )
        .unwrap();
        let world = lattice.cartesian_sites();
        assert_eq!(world[1], Coordinate::new(0.0, 0.0, 2.0));
    }
}
