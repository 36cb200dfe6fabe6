// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The lattice index map: (cell, basis) ↔ global site index.
//!
//! Layout invariant: `gidx = ((a·nB) + b)·nC·nBasis + c·nBasis + i` with the
//! basis index fastest. Every component that resolves stencil offsets uses
//! this map, so the bijection is defined exactly once.

/// Decoded site address: cell indices plus basis index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteAddress {
    /// Cell index along the first axis.
    pub a: usize,
    /// Cell index along the second axis.
    pub b: usize,
    /// Cell index along the third axis.
    pub c: usize,
    /// Basis point index within the cell.
    pub basis: usize,
}

/// Integer stencil offset relative to a center site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellOffset {
    /// Cell displacement along the first axis.
    pub da: i32,
    /// Cell displacement along the second axis.
    pub db: i32,
    /// Cell displacement along the third axis.
    pub dc: i32,
    /// Basis index of the target site.
    pub basis: usize,
}

/// Immutable map between cell coordinates and global indices, with periodic
/// wrapping.
#[derive(Debug, Clone)]
pub struct LatticeMap {
    n_a: usize,
    n_b: usize,
    n_c: usize,
    n_basis: usize,
    periodic: [bool; 3],
}

impl LatticeMap {
    /// Creates the map for `repetitions` cells of `n_basis` points each.
    pub fn new(repetitions: (usize, usize, usize), n_basis: usize, periodic: [bool; 3]) -> Self {
        let (n_a, n_b, n_c) = repetitions;
        Self {
            n_a,
            n_b,
            n_c,
            n_basis,
            periodic,
        }
    }

    /// Total number of sites.
    pub fn n_sites(&self) -> usize {
        self.n_a * self.n_b * self.n_c * self.n_basis
    }

    /// Number of basis points per cell.
    pub fn n_basis(&self) -> usize {
        self.n_basis
    }

    /// Cell repetitions along the three axes.
    pub fn repetitions(&self) -> (usize, usize, usize) {
        (self.n_a, self.n_b, self.n_c)
    }

    /// Per-axis periodicity flags.
    pub fn periodicity(&self) -> [bool; 3] {
        self.periodic
    }

    /// Encodes a site address into its global index.
    pub fn global_index(&self, a: usize, b: usize, c: usize, basis: usize) -> usize {
        debug_assert!(a < self.n_a && b < self.n_b && c < self.n_c && basis < self.n_basis);
        ((a * self.n_b + b) * self.n_c + c) * self.n_basis + basis
    }

    /// Decodes a global index back into its site address.
    pub fn address_of(&self, gidx: usize) -> SiteAddress {
        debug_assert!(gidx < self.n_sites());
        let basis = gidx % self.n_basis;
        let cells = gidx / self.n_basis;
        let c = cells % self.n_c;
        let rest = cells / self.n_c;
        let b = rest % self.n_b;
        let a = rest / self.n_b;
        SiteAddress { a, b, c, basis }
    }

    /// Global indices of every site in one cell, basis order.
    pub fn indices_from_cell(&self, a: usize, b: usize, c: usize) -> Vec<usize> {
        (0..self.n_basis)
            .map(|i| self.global_index(a, b, c, i))
            .collect()
    }

    fn wrap(value: i64, extent: usize, periodic: bool) -> Option<usize> {
        let extent_i = extent as i64;
        if periodic {
            Some(value.rem_euclid(extent_i) as usize)
        } else if (0..extent_i).contains(&value) {
            Some(value as usize)
        } else {
            None
        }
    }

    /// Resolves one stencil offset from a center address.
    ///
    /// Returns `None` when an aperiodic axis would leave the box; callers
    /// treat such neighbours as non-matching, never as wrapped.
    pub fn neighbour(&self, center: SiteAddress, offset: CellOffset) -> Option<usize> {
        let a = Self::wrap(
            center.a as i64 + i64::from(offset.da),
            self.n_a,
            self.periodic[0],
        )?;
        let b = Self::wrap(
            center.b as i64 + i64::from(offset.db),
            self.n_b,
            self.periodic[1],
        )?;
        let c = Self::wrap(
            center.c as i64 + i64::from(offset.dc),
            self.n_c,
            self.periodic[2],
        )?;
        Some(self.global_index(a, b, c, offset.basis))
    }

    /// Resolves a whole stencil into a caller-owned buffer.
    ///
    /// The buffer is cleared and refilled; reusing it keeps the per-event
    /// matching path allocation-free.
    pub fn fill_neighbourhood(
        &self,
        center: SiteAddress,
        stencil: &[CellOffset],
        out: &mut Vec<Option<usize>>,
    ) {
        out.clear();
        out.extend(stencil.iter().map(|&o| self.neighbour(center, o)));
    }
}
