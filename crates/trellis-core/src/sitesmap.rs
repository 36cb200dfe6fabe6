// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The sites map: static per-site site types.
//!
//! Same dense shape as the configuration, but frozen: site types never
//! change during a run, carry no atom identity, and are only read by the
//! matching walk.

use trellis_geom::Lattice;

use crate::config::resolve_type_codes;
use crate::error::Error;
use crate::lattice_map::LatticeMap;
use crate::species::TypeRegistry;

/// Immutable per-site site types.
#[derive(Debug, Clone)]
pub struct SitesMap {
    types: Vec<u32>,
    registry: TypeRegistry,
}

impl SitesMap {
    /// Builds a sites map where every site shares one default site type.
    ///
    /// The common case for site-untyped simulations; processes without site
    /// types match everywhere regardless.
    pub fn uniform(lattice: &Lattice, site_type: &str) -> Result<Self, Error> {
        let names = vec![site_type.to_string(); lattice.n_sites()];
        Self::from_types(lattice, &names, None)
    }

    /// Builds a sites map from a dense site-type list ordered `(a, b, c, i)`.
    pub fn from_types<S: AsRef<str>>(
        lattice: &Lattice,
        types: &[S],
        possible: Option<&[S]>,
    ) -> Result<Self, Error> {
        let map = LatticeMap::new(
            lattice.repetitions(),
            lattice.n_basis(),
            lattice.periodicity(),
        );
        let names: Vec<String> = types.iter().map(|s| s.as_ref().to_string()).collect();
        let possible: Option<Vec<String>> =
            possible.map(|p| p.iter().map(|s| s.as_ref().to_string()).collect());
        let (codes, registry) =
            resolve_type_codes(&map, Some(&names), None, possible.as_deref())?;
        Ok(Self {
            types: codes,
            registry,
        })
    }

    /// Builds a sites map from sparse `(a, b, c, basis, site type)` entries.
    pub fn from_sparse(
        lattice: &Lattice,
        entries: &[(usize, usize, usize, usize, String)],
        default: &str,
        possible: Option<&[String]>,
    ) -> Result<Self, Error> {
        let map = LatticeMap::new(
            lattice.repetitions(),
            lattice.n_basis(),
            lattice.periodicity(),
        );
        let (codes, registry) = resolve_type_codes(&map, None, Some((entries, default)), possible)?;
        Ok(Self {
            types: codes,
            registry,
        })
    }

    /// Number of sites.
    pub fn n_sites(&self) -> usize {
        self.types.len()
    }

    /// Dense site-type codes, site order.
    pub fn types(&self) -> &[u32] {
        &self.types
    }

    /// Site-type code at one site.
    pub fn type_at(&self, gidx: usize) -> u32 {
        self.types[gidx]
    }

    /// The site-type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}
