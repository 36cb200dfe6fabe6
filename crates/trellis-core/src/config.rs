// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The mutable configuration: per-site species and atom identities.

use trellis_geom::{Coordinate, Lattice};

use crate::error::Error;
use crate::lattice_map::LatticeMap;
use crate::process::Process;
use crate::species::TypeRegistry;

/// Resolves user-supplied type names into dense codes plus a registry.
///
/// Shared by [`Configuration`] and [`crate::sitesmap::SitesMap`]: both accept
/// either a dense name list or the sparse `(a, b, c, basis, name)` format
/// with a default name, and an optional explicit list of possible types.
pub(crate) fn resolve_type_codes(
    map: &LatticeMap,
    dense: Option<&[String]>,
    sparse: Option<(&[(usize, usize, usize, usize, String)], &str)>,
    possible: Option<&[String]>,
) -> Result<(Vec<u32>, TypeRegistry), Error> {
    let names: Vec<String> = match (dense, sparse) {
        (Some(list), None) => {
            if list.len() != map.n_sites() {
                return Err(Error::validation(format!(
                    "types length {} does not match the {} lattice sites",
                    list.len(),
                    map.n_sites()
                )));
            }
            list.to_vec()
        }
        (None, Some((entries, default))) => {
            let (n_a, n_b, n_c) = map.repetitions();
            let mut filled = vec![default.to_string(); map.n_sites()];
            for &(a, b, c, basis, ref name) in entries {
                if a >= n_a || b >= n_b || c >= n_c || basis >= map.n_basis() {
                    return Err(Error::validation(format!(
                        "sparse type entry ({a}, {b}, {c}, {basis}) is outside the lattice"
                    )));
                }
                filled[map.global_index(a, b, c, basis)] = name.clone();
            }
            filled
        }
        _ => {
            return Err(Error::validation(
                "exactly one of the dense and sparse type formats must be given",
            ))
        }
    };

    let registry = match possible {
        Some(possible) => {
            let registry = TypeRegistry::new(possible)?;
            for name in &names {
                if registry.code(name).is_none() {
                    return Err(Error::validation(format!(
                        "type '{name}' is present but missing from the possible types"
                    )));
                }
            }
            registry
        }
        None => {
            let mut present: Vec<&String> = names.iter().collect();
            present.sort();
            present.dedup();
            TypeRegistry::new(&present)?
        }
    };

    let codes = names
        .iter()
        .map(|n| registry.require(n))
        .collect::<Result<Vec<u32>, Error>>()?;
    Ok((codes, registry))
}

/// Current per-site species, with stable atom identities for trajectory
/// tracking.
///
/// Owned by the model during a run; only [`Configuration::perform_move`]
/// mutates it, and only the driver calls that. Everything derived (available
/// sites, rate trees) is reconstructable from this plus the sites map and
/// the processes.
#[derive(Debug, Clone)]
pub struct Configuration {
    types: Vec<u32>,
    atom_id: Vec<u32>,
    atom_id_coord: Vec<Coordinate>,
    moved_atom_ids: Vec<u32>,
    updated_sites: Vec<usize>,
    species: TypeRegistry,
    // Scratch for the stencil walk; not part of the logical state.
    neigh_buf: Vec<Option<usize>>,
    move_buf: Vec<(usize, u32, Coordinate)>,
}

impl Configuration {
    /// Builds a configuration from a dense species list ordered `(a, b, c, i)`
    /// with the basis index fastest.
    ///
    /// When `possible` is omitted the possible types are the distinct species
    /// present, sorted for a deterministic code assignment.
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
        Ok(Self::from_codes(lattice, codes, registry))
    }

    /// Builds a configuration from sparse `(a, b, c, basis, species)` entries
    /// over a default species.
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
        let (codes, registry) =
            resolve_type_codes(&map, None, Some((entries, default)), possible)?;
        Ok(Self::from_codes(lattice, codes, registry))
    }

    fn from_codes(lattice: &Lattice, types: Vec<u32>, species: TypeRegistry) -> Self {
        let n = types.len();
        let atom_id_coord = lattice.cartesian_sites();
        Self {
            types,
            atom_id: (0..n as u32).collect(),
            atom_id_coord,
            moved_atom_ids: Vec::new(),
            updated_sites: Vec::new(),
            species,
            neigh_buf: Vec::new(),
            move_buf: Vec::new(),
        }
    }

    /// Number of lattice sites.
    pub fn n_sites(&self) -> usize {
        self.types.len()
    }

    /// The species registry (possible types, wildcard at code 0).
    pub fn species(&self) -> &TypeRegistry {
        &self.species
    }

    /// Dense species codes, site order.
    pub fn types(&self) -> &[u32] {
        &self.types
    }

    /// Species code at one site.
    pub fn type_at(&self, gidx: usize) -> u32 {
        self.types[gidx]
    }

    /// Species names, site order. A fresh copy.
    pub fn elements(&self) -> Vec<String> {
        self.types
            .iter()
            .map(|&c| self.species.name(c).to_string())
            .collect()
    }

    /// Species names indexed by atom id. A fresh copy.
    pub fn atom_id_elements(&self) -> Vec<String> {
        let mut out = vec![String::new(); self.types.len()];
        for (site, &id) in self.atom_id.iter().enumerate() {
            out[id as usize] = self.species.name(self.types[site]).to_string();
        }
        out
    }

    /// Accumulated cartesian coordinates per atom id. A fresh copy.
    pub fn atom_id_coordinates(&self) -> Vec<Coordinate> {
        self.atom_id_coord.clone()
    }

    /// Atom ids displaced by the most recent event.
    pub fn moved_atom_ids(&self) -> &[u32] {
        &self.moved_atom_ids
    }

    /// Sites written by the most recent event: the seed of the incremental
    /// re-matching pass.
    pub fn last_updated_sites(&self) -> &[usize] {
        &self.updated_sites
    }

    /// Atom id currently at one site.
    pub fn atom_id_at(&self, gidx: usize) -> u32 {
        self.atom_id[gidx]
    }

    /// Applies a process at a site: writes the update types of the match
    /// list and carries atom identities along the move vectors.
    ///
    /// The caller guarantees the process matches at `gidx`; entries whose
    /// update type is the wildcard write nothing. O(m) in the stencil size
    /// and allocation-free after warm-up.
    pub fn perform_move(&mut self, process: &Process, gidx: usize, map: &LatticeMap) {
        let addr = map.address_of(gidx);
        let Some(stencil) = process.resolved_stencil(addr.basis) else {
            debug_assert!(false, "perform_move at a basis the process excludes");
            return;
        };
        let mut neigh = std::mem::take(&mut self.neigh_buf);
        map.fill_neighbourhood(addr, stencil, &mut neigh);

        // Collect the moving atoms before any write: a move set is a
        // permutation and sequential swaps would corrupt 2-cycles.
        self.move_buf.clear();
        for (k, entry) in process.match_list().iter().enumerate() {
            if let (Some(to), Some(delta)) = (entry.move_to, process.move_delta_cartesian(k)) {
                let (Some(from_g), Some(to_g)) = (neigh[k], neigh[to]) else {
                    debug_assert!(false, "move across an unresolved neighbour");
                    continue;
                };
                let id = self.atom_id[from_g];
                self.move_buf.push((to_g, id, delta));
            }
        }

        self.updated_sites.clear();
        for (k, entry) in process.match_list().iter().enumerate() {
            if entry.update_type == 0 {
                continue;
            }
            if let Some(n) = neigh[k] {
                self.types[n] = entry.update_type;
                self.updated_sites.push(n);
            } else {
                debug_assert!(false, "update across an unresolved neighbour");
            }
        }

        self.moved_atom_ids.clear();
        let moves = std::mem::take(&mut self.move_buf);
        for &(to_g, id, delta) in &moves {
            self.atom_id[to_g] = id;
            let coord = &mut self.atom_id_coord[id as usize];
            *coord = coord.add(&delta);
            self.moved_atom_ids.push(id);
        }
        self.move_buf = moves;
        self.neigh_buf = neigh;
    }

    /// Overwrites the species and atom id at one site.
    ///
    /// Redistribution uses this to permute `(species, atom id)` pairs; the
    /// step loop never does.
    pub(crate) fn set_site(&mut self, gidx: usize, species: u32, atom_id: u32) {
        self.types[gidx] = species;
        self.atom_id[gidx] = atom_id;
    }

    /// BLAKE3 digest over `(types, atom ids)`: a cheap whole-state
    /// fingerprint for determinism audits.
    pub fn state_digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        for &t in &self.types {
            hasher.update(&t.to_le_bytes());
        }
        for &id in &self.atom_id {
            hasher.update(&id.to_le_bytes());
        }
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use trellis_geom::Lattice;

    use super::*;

    fn lattice_2x2() -> Lattice {
        Lattice::simple_cubic((2, 2, 1), [true, true, false])
    }

    #[test]
    fn dense_constructor_assigns_sorted_codes() {
        let cfg =
            Configuration::from_types(&lattice_2x2(), &["B", "A", "B", "A"], None).unwrap();
        // Derived possible types sort to [A, B]: codes 1 and 2.
        assert_eq!(cfg.types(), &[2, 1, 2, 1]);
        assert_eq!(cfg.elements(), vec!["B", "A", "B", "A"]);
    }

    #[test]
    fn dense_constructor_rejects_wrong_length() {
        assert!(Configuration::from_types(&lattice_2x2(), &["A"], None).is_err());
    }

    #[test]
    fn possible_types_must_cover_present_types() {
        let err = Configuration::from_types(
            &lattice_2x2(),
            &["A", "A", "B", "A"],
            Some(&["A", "C"]),
        );
        assert!(err.is_err());
    }

    #[test]
    fn sparse_constructor_fills_default() {
        let lattice = lattice_2x2();
        let cfg = Configuration::from_sparse(
            &lattice,
            &[(1, 0, 0, 0, "A".to_string())],
            "V",
            None,
        )
        .unwrap();
        let map = LatticeMap::new((2, 2, 1), 1, [true, true, false]);
        let mut expect = vec!["V"; 4];
        expect[map.global_index(1, 0, 0, 0)] = "A";
        assert_eq!(cfg.elements(), expect);
    }

    #[test]
    fn sparse_constructor_checks_bounds() {
        let err = Configuration::from_sparse(
            &lattice_2x2(),
            &[(2, 0, 0, 0, "A".to_string())],
            "V",
            None,
        );
        assert!(err.is_err());
    }

    #[test]
    fn atom_ids_start_as_site_indices() {
        let cfg = Configuration::from_types(&lattice_2x2(), &["A"; 4], None).unwrap();
        assert_eq!((0..4).map(|g| cfg.atom_id_at(g)).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(cfg.atom_id_elements(), vec!["A"; 4]);
    }

    #[test]
    fn digest_tracks_state_changes() {
        let mut cfg = Configuration::from_types(&lattice_2x2(), &["A", "A", "B", "B"], None).unwrap();
        let before = cfg.state_digest();
        assert_eq!(before, cfg.state_digest());
        cfg.set_site(0, 2, 0);
        assert_ne!(before, cfg.state_digest());
    }
}
