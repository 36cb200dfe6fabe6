// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Compiled processes and their available-site sets.

use rustc_hash::FxHashMap;
use trellis_geom::{Coordinate, Lattice, COORDINATE_EPS};

use crate::config::Configuration;
use crate::error::Error;
use crate::lattice_map::{CellOffset, LatticeMap};
use crate::matchlist::{MatchEntry, ProcessSpec};
use crate::rate_tree::RateTree;
use crate::sitesmap::SitesMap;

/// The set of sites where one process currently matches.
///
/// O(1) membership, insertion and removal (swap-with-last), plus indexed
/// access by insertion ordinal — the shape the selection step needs to pick
/// a site uniformly in O(1) or rate-weighted through a parallel tree.
#[derive(Debug, Clone, Default)]
pub struct AvailableSites {
    sites: Vec<usize>,
    slots: FxHashMap<usize, usize>,
}

impl AvailableSites {
    /// Number of available sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// `true` when no site is available.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, gidx: usize) -> bool {
        self.slots.contains_key(&gidx)
    }

    /// Site at insertion ordinal `slot`.
    pub fn get(&self, slot: usize) -> usize {
        self.sites[slot]
    }

    /// All available sites in slot order.
    pub fn as_slice(&self) -> &[usize] {
        &self.sites
    }

    /// Inserts a site; returns `false` when it was already present.
    fn insert(&mut self, gidx: usize) -> bool {
        if self.slots.contains_key(&gidx) {
            return false;
        }
        self.slots.insert(gidx, self.sites.len());
        self.sites.push(gidx);
        true
    }

    /// Removes a site by swapping the last slot into its place; returns the
    /// vacated slot when the site was present.
    fn remove(&mut self, gidx: usize) -> Option<usize> {
        let slot = self.slots.remove(&gidx)?;
        self.sites.swap_remove(slot);
        if let Some(&moved) = self.sites.get(slot) {
            self.slots.insert(moved, slot);
        }
        Some(slot)
    }

    fn clear(&mut self) {
        self.sites.clear();
        self.slots.clear();
    }
}

/// One compiled rewrite rule with its bookkeeping.
///
/// Holds the wildcard-expanded match list, the per-basis integer stencils
/// resolved against the lattice geometry, the cartesian move displacements,
/// and the live available-site set (plus a per-site rate tree when a custom
/// rate calculator drives the run).
#[derive(Debug, Clone)]
pub struct Process {
    id: usize,
    match_list: Vec<MatchEntry>,
    basis_sites: Vec<usize>,
    rate: f64,
    fast: bool,
    redist: bool,
    redist_species: u32,
    resolved: Vec<Option<Vec<CellOffset>>>,
    move_delta_cart: Vec<Option<Coordinate>>,
    stencil_coords: Vec<Coordinate>,
    cutoff_len: usize,
    available: AvailableSites,
    site_rates: Option<RateTree>,
}

impl Process {
    /// Compiles a spec (with its already-expanded match list) against the
    /// lattice geometry.
    ///
    /// `custom_rates` switches on the per-site rate tree; `cutoff` is the
    /// rate-calculator neighbourhood radius, where the conventional value
    /// `1.0` means "this process's own stencil extent".
    pub(crate) fn compile(
        id: usize,
        spec: &ProcessSpec,
        match_list: Vec<MatchEntry>,
        lattice: &Lattice,
        custom_rates: bool,
        cutoff: f64,
    ) -> Result<Self, Error> {
        let n_basis = lattice.n_basis();
        let basis_points = lattice.basis();
        let mut resolved = vec![None; n_basis];
        for &ib in spec.basis_sites() {
            if ib >= n_basis {
                // Basis indices beyond the cell are ignored, not an error.
                continue;
            }
            let mut stencil = Vec::with_capacity(match_list.len());
            for entry in &match_list {
                let target = basis_points[ib].add(&entry.offset);
                let mut found = None;
                for (jb, bp) in basis_points.iter().enumerate() {
                    let d = target.sub(bp);
                    let near = |v: f64| (v - v.round()).abs() < COORDINATE_EPS;
                    if near(d.x) && near(d.y) && near(d.z) {
                        found = Some(CellOffset {
                            da: d.x.round() as i32,
                            db: d.y.round() as i32,
                            dc: d.z.round() as i32,
                            basis: jb,
                        });
                        break;
                    }
                }
                let Some(offset) = found else {
                    return Err(Error::validation(format!(
                        "process {id}: stencil offset ({}, {}, {}) does not land on a lattice \
                         site from basis {ib}",
                        entry.offset.x, entry.offset.y, entry.offset.z
                    )));
                };
                stencil.push(offset);
            }
            resolved[ib] = Some(stencil);
        }
        if resolved.iter().all(Option::is_none) {
            return Err(Error::validation(format!(
                "process {id}: no basis site within the {n_basis} cell basis points"
            )));
        }

        let move_delta_cart = match_list
            .iter()
            .map(|e| e.move_vector.as_ref().map(|v| lattice.cell().to_cartesian(v)))
            .collect();
        let stencil_coords = match_list.iter().map(|e| e.offset).collect();

        let extent = match_list.last().map_or(0.0, |e| e.distance);
        let radius = if (cutoff - 1.0).abs() < COORDINATE_EPS {
            extent
        } else {
            cutoff
        };
        let cutoff_len = match_list
            .iter()
            .take_while(|e| e.distance <= radius + COORDINATE_EPS)
            .count()
            .max(1);

        Ok(Self {
            id,
            match_list,
            basis_sites: spec.basis_sites().to_vec(),
            rate: spec.rate(),
            fast: spec.fast(),
            redist: spec.redist(),
            // The species code is attached by the interactions builder once
            // the configuration's registry is at hand.
            redist_species: 0,
            resolved,
            move_delta_cart,
            stencil_coords,
            cutoff_len,
            available: AvailableSites::default(),
            site_rates: custom_rates.then(|| RateTree::new(0)),
        })
    }

    /// Stores the dense code of the redistribution species.
    pub(crate) fn set_redist_species_code(&mut self, code: u32) {
        self.redist_species = code;
    }

    /// Process id (index in the interactions arena).
    pub fn id(&self) -> usize {
        self.id
    }

    /// The compiled match list in canonical order.
    pub fn match_list(&self) -> &[MatchEntry] {
        &self.match_list
    }

    /// The basis-site filter.
    pub fn basis_sites(&self) -> &[usize] {
        &self.basis_sites
    }

    /// Base rate constant.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Fast-process flag.
    pub fn fast(&self) -> bool {
        self.fast
    }

    /// Redistribution-process flag.
    pub fn redist(&self) -> bool {
        self.redist
    }

    /// Dense species code scattered by this redistribution process.
    pub fn redist_species(&self) -> u32 {
        self.redist_species
    }

    /// Number of leading match-list entries inside the rate-calculator
    /// cutoff.
    pub fn cutoff_len(&self) -> usize {
        self.cutoff_len
    }

    /// The integer stencil for a given center basis, when the basis filter
    /// admits it.
    pub fn resolved_stencil(&self, basis: usize) -> Option<&[CellOffset]> {
        self.resolved.get(basis)?.as_deref()
    }

    /// Cartesian displacement of the atom moved by entry `k`.
    pub fn move_delta_cartesian(&self, k: usize) -> Option<Coordinate> {
        self.move_delta_cart[k]
    }

    /// Stencil offsets in match-list order, as one contiguous slice.
    pub fn stencil_coordinates(&self) -> &[Coordinate] {
        &self.stencil_coords
    }

    /// The live available-site set.
    pub fn available(&self) -> &AvailableSites {
        &self.available
    }

    /// Walks the match list at `gidx`; `true` when every entry matches.
    ///
    /// `buf` is a reusable neighbour buffer owned by the caller.
    pub fn matches_at(
        &self,
        gidx: usize,
        cfg: &Configuration,
        sites: &SitesMap,
        map: &LatticeMap,
        buf: &mut Vec<Option<usize>>,
    ) -> bool {
        let addr = map.address_of(gidx);
        let Some(stencil) = self.resolved_stencil(addr.basis) else {
            return false;
        };
        map.fill_neighbourhood(addr, stencil, buf);
        for (entry, neighbour) in self.match_list.iter().zip(buf.iter()) {
            let Some(n) = neighbour else {
                // Off-box on an aperiodic axis: the process cannot apply.
                return false;
            };
            if entry.match_type != 0 && entry.match_type != cfg.type_at(*n) {
                return false;
            }
            if entry.site_type != 0 && entry.site_type != sites.type_at(*n) {
                return false;
            }
        }
        true
    }

    /// Total selection rate of this process: base rate times multiplicity,
    /// or the per-site sum under a custom calculator.
    pub fn total_rate(&self) -> f64 {
        self.site_rates.as_ref().map_or_else(
            || self.rate * self.available.len() as f64,
            RateTree::total,
        )
    }

    /// Inserts an available site; `site_rate` feeds the per-site tree under
    /// a custom calculator. Returns `false` when already present.
    pub(crate) fn insert_available(&mut self, gidx: usize, site_rate: Option<f64>) -> bool {
        if !self.available.insert(gidx) {
            return false;
        }
        if let Some(tree) = &mut self.site_rates {
            tree.push(site_rate.unwrap_or(self.rate));
        }
        true
    }

    /// Removes an available site. Returns `false` when it was not present.
    pub(crate) fn remove_available(&mut self, gidx: usize) -> bool {
        let Some(slot) = self.available.remove(gidx) else {
            return false;
        };
        if let Some(tree) = &mut self.site_rates {
            // Mirror the swap-with-last performed by the site set.
            if let Some(last_rate) = tree.pop() {
                if slot < tree.len() {
                    tree.set(slot, last_rate);
                }
            }
        }
        true
    }

    /// Replaces the per-site rate of an available site (custom mode only).
    pub(crate) fn update_site_rate(&mut self, gidx: usize, rate: f64) {
        if let (Some(tree), Some(&slot)) = (&mut self.site_rates, self.available.slots.get(&gidx)) {
            tree.set(slot, rate);
        }
    }

    /// Picks an available site from a uniform draw `u ∈ [0, 1)`.
    ///
    /// Uniform over sites under fixed rates; proportional to per-site rate
    /// under a custom calculator.
    pub(crate) fn pick_site(&self, u: f64) -> Option<usize> {
        if self.available.is_empty() {
            return None;
        }
        match &self.site_rates {
            None => {
                let slot =
                    ((u * self.available.len() as f64) as usize).min(self.available.len() - 1);
                Some(self.available.get(slot))
            }
            Some(tree) => tree
                .pick(u * tree.total())
                .map(|slot| self.available.get(slot)),
        }
    }

    /// Empties the available set (used by full rebuilds).
    pub(crate) fn clear_available(&mut self) {
        self.available.clear();
        if let Some(tree) = &mut self.site_rates {
            *tree = RateTree::new(0);
        }
    }
}
