// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The interactions arena: all processes, selection, and re-evaluation.
//!
//! Ownership (arena-and-index): this object owns every [`Process`] by value
//! and the process-level rate tree; everything else refers to a process by
//! its integer id. The configuration knows nothing about processes; the
//! inverse stencil built here at startup is what turns a local rewrite into
//! the exact set of sites to re-match.

use rand::Rng;
use rustc_hash::FxHashSet;
use trellis_geom::{Coordinate, Lattice};

use crate::config::Configuration;
use crate::error::Error;
use crate::lattice_map::{CellOffset, LatticeMap};
use crate::matchlist::{expand_implicit_wildcards, ProcessSpec};
use crate::process::Process;
use crate::prng::SimRng;
use crate::rate::{RateCalculator, RateContext, RateModel};
use crate::rate_tree::RateTree;
use crate::sitesmap::SitesMap;

/// All possible interactions of a simulation.
#[derive(Debug)]
pub struct Interactions {
    specs: Vec<ProcessSpec>,
    implicit_wildcards: bool,
    rate_model: RateModel,
    processes: Vec<Process>,
    rate_tree: RateTree,
    /// Inverse stencil, indexed by the basis of an updated site: cell
    /// offsets (already negated) and center basis of every stencil entry
    /// that can reach it.
    inverse: Vec<Vec<CellOffset>>,
    picked_index: Option<usize>,
    // Scratch buffers for the hot path.
    neigh_buf: Vec<Option<usize>>,
    before_buf: Vec<u32>,
    after_buf: Vec<u32>,
    affected_buf: Vec<usize>,
}

impl Interactions {
    /// Creates the arena from validated process specs.
    ///
    /// `implicit_wildcards` enables the union-stencil pre-expansion of the
    /// match lists when the model is built.
    pub fn new(specs: Vec<ProcessSpec>, implicit_wildcards: bool) -> Self {
        Self {
            specs,
            implicit_wildcards,
            rate_model: RateModel::Fixed,
            processes: Vec::new(),
            rate_tree: RateTree::new(0),
            inverse: Vec::new(),
            picked_index: None,
            neigh_buf: Vec::new(),
            before_buf: Vec::new(),
            after_buf: Vec::new(),
            affected_buf: Vec::new(),
        }
    }

    /// Attaches a custom rate calculator.
    ///
    /// Must happen before the lattice model builds the arena; afterwards the
    /// call has no effect on the already-built trees.
    pub fn set_rate_calculator(&mut self, calculator: Box<dyn RateCalculator>) {
        self.rate_model = RateModel::Custom(calculator);
    }

    /// Whether implicit wildcard padding is enabled.
    pub fn implicit_wildcards(&self) -> bool {
        self.implicit_wildcards
    }

    /// The compiled processes.
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// One compiled process by id.
    pub fn process(&self, id: usize) -> &Process {
        &self.processes[id]
    }

    /// Number of processes.
    pub fn n_processes(&self) -> usize {
        self.processes.len()
    }

    /// Index of the process picked by the most recent selection.
    pub fn picked_index(&self) -> Option<usize> {
        self.picked_index
    }

    /// Available-site count per process.
    pub fn process_available_sites(&self) -> Vec<usize> {
        self.processes.iter().map(|p| p.available().len()).collect()
    }

    /// Base rate constant per process.
    pub fn process_rates(&self) -> Vec<f64> {
        self.processes.iter().map(Process::rate).collect()
    }

    /// Sum of available-site counts over all processes.
    pub fn total_available_sites(&self) -> usize {
        self.processes.iter().map(|p| p.available().len()).sum()
    }

    /// The total selection rate Σᵢ rateᵢ.
    pub fn total_rate(&self) -> f64 {
        self.rate_tree.total()
    }

    /// Compiles the specs against the geometry and runs the initial full
    /// matching.
    pub(crate) fn build(
        &mut self,
        cfg: &Configuration,
        sites: &SitesMap,
        lattice: &Lattice,
        map: &LatticeMap,
    ) -> Result<(), Error> {
        let species = cfg.species();
        let mut lists = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            lists.push(spec.compile(species, sites.registry())?);
        }
        if self.implicit_wildcards {
            expand_implicit_wildcards(&mut lists);
        }

        let custom = self.rate_model.is_custom();
        let cutoff = self.rate_model.cutoff().unwrap_or(1.0);
        self.processes = Vec::with_capacity(self.specs.len());
        for (id, (spec, list)) in self.specs.iter().zip(lists).enumerate() {
            let mut process = Process::compile(id, spec, list, lattice, custom, cutoff)?;
            if spec.redist() {
                process.set_redist_species_code(species.require(spec.redist_species())?);
            }
            self.processes.push(process);
        }

        self.build_inverse_stencil(map.n_basis());
        self.rebuild_from_scratch(cfg, sites, lattice, map)
    }

    /// The inverse stencil depends only on the union stencil and the cell
    /// basis; it is built once.
    fn build_inverse_stencil(&mut self, n_basis: usize) {
        let mut seen: FxHashSet<(usize, i32, i32, i32, usize)> = FxHashSet::default();
        self.inverse = vec![Vec::new(); n_basis];
        for process in &self.processes {
            for ib in 0..n_basis {
                let Some(stencil) = process.resolved_stencil(ib) else {
                    continue;
                };
                for offset in stencil {
                    let key = (offset.basis, offset.da, offset.db, offset.dc, ib);
                    if seen.insert(key) {
                        self.inverse[offset.basis].push(CellOffset {
                            da: -offset.da,
                            db: -offset.db,
                            dc: -offset.dc,
                            basis: ib,
                        });
                    }
                }
            }
        }
    }

    /// Discards every available set and re-matches all processes against all
    /// candidate sites.
    ///
    /// Used after redistribution, and by tests that compare the incremental
    /// state against a fresh one.
    pub(crate) fn rebuild_from_scratch(
        &mut self,
        cfg: &Configuration,
        sites: &SitesMap,
        lattice: &Lattice,
        map: &LatticeMap,
    ) -> Result<(), Error> {
        for process in &mut self.processes {
            process.clear_available();
        }
        let n = map.n_sites();
        for idx in 0..self.processes.len() {
            for gidx in 0..n {
                self.refresh_pair(idx, gidx, cfg, sites, lattice, map)?;
            }
        }
        self.rate_tree = RateTree::new(self.processes.len());
        for (idx, process) in self.processes.iter().enumerate() {
            self.rate_tree.set(idx, process.total_rate());
        }
        Ok(())
    }

    /// Selects a `(process, site)` pair in proportion to rate.
    ///
    /// Two uniform draws: the first walks the process tree, the second picks
    /// the site (uniform under fixed rates, per-site-rate-weighted under a
    /// custom calculator). Returns `None` when the total rate is zero.
    pub fn pick(&mut self, rng: &mut SimRng) -> Option<(usize, usize)> {
        let total = self.rate_tree.total();
        if total <= 0.0 {
            return None;
        }
        let u1: f64 = rng.gen();
        let u2: f64 = rng.gen();
        let process_idx = self.rate_tree.pick(u1 * total)?;
        let site = self.processes[process_idx].pick_site(u2)?;
        self.picked_index = Some(process_idx);
        Some((process_idx, site))
    }

    /// Re-evaluates matching in the neighbourhood of the given updated
    /// sites (through the inverse stencil) and refreshes the rate trees.
    pub fn update_matching(
        &mut self,
        cfg: &Configuration,
        sites: &SitesMap,
        lattice: &Lattice,
        map: &LatticeMap,
        updated_sites: &[usize],
    ) -> Result<(), Error> {
        let mut affected = std::mem::take(&mut self.affected_buf);
        affected.clear();
        for &updated in updated_sites {
            let addr = map.address_of(updated);
            for offset in &self.inverse[addr.basis] {
                if let Some(center) = map.neighbour(addr, *offset) {
                    affected.push(center);
                }
            }
        }
        // Deterministic order, visited once.
        affected.sort_unstable();
        affected.dedup();

        for idx in 0..self.processes.len() {
            for &gidx in &affected {
                self.refresh_pair(idx, gidx, cfg, sites, lattice, map)?;
            }
            self.rate_tree.set(idx, self.processes[idx].total_rate());
        }
        self.affected_buf = affected;
        Ok(())
    }

    /// Brings one `(process, site)` pair up to date: inserts, removes, or
    /// (under a custom calculator) refreshes the per-site rate.
    fn refresh_pair(
        &mut self,
        process_idx: usize,
        gidx: usize,
        cfg: &Configuration,
        sites: &SitesMap,
        lattice: &Lattice,
        map: &LatticeMap,
    ) -> Result<(), Error> {
        let mut neigh = std::mem::take(&mut self.neigh_buf);
        let matches =
            self.processes[process_idx].matches_at(gidx, cfg, sites, map, &mut neigh);
        self.neigh_buf = neigh;
        let was_available = self.processes[process_idx].available().contains(gidx);
        match (matches, was_available, self.rate_model.is_custom()) {
            (true, false, false) => {
                self.processes[process_idx].insert_available(gidx, None);
            }
            (true, _, true) => {
                let rate = self.effective_rate(process_idx, gidx, cfg, lattice, map)?;
                let process = &mut self.processes[process_idx];
                if was_available {
                    process.update_site_rate(gidx, rate);
                } else {
                    process.insert_available(gidx, Some(rate));
                }
            }
            (false, true, _) => {
                self.processes[process_idx].remove_available(gidx);
            }
            _ => {}
        }
        Ok(())
    }

    /// Calls the custom calculator for one pair, with clamping and the
    /// finiteness check.
    fn effective_rate(
        &mut self,
        process_idx: usize,
        gidx: usize,
        cfg: &Configuration,
        lattice: &Lattice,
        map: &LatticeMap,
    ) -> Result<f64, Error> {
        if !self.rate_model.is_custom() {
            return Ok(self.processes[process_idx].rate());
        }
        let mut before = std::mem::take(&mut self.before_buf);
        let mut after = std::mem::take(&mut self.after_buf);
        let rate = {
            let process = &self.processes[process_idx];
            let n = process.cutoff_len();
            let addr = map.address_of(gidx);
            let Some(stencil) = process.resolved_stencil(addr.basis) else {
                self.before_buf = before;
                self.after_buf = after;
                return Ok(0.0);
            };

            before.clear();
            after.clear();
            for (k, entry) in process.match_list().iter().take(n).enumerate() {
                let current = map
                    .neighbour(addr, stencil[k])
                    .map_or(0, |site| cfg.type_at(site));
                before.push(current);
                after.push(if entry.update_type == 0 {
                    current
                } else {
                    entry.update_type
                });
            }

            let fractional = Coordinate::new(addr.a as f64, addr.b as f64, addr.c as f64)
                .add(&lattice.basis()[addr.basis]);
            let ctx = RateContext {
                coordinates: &process.stencil_coordinates()[..n],
                types_before: &before,
                types_after: &after,
                base_rate: process.rate(),
                process_id: process.id(),
                global_coordinate: lattice.cell().to_cartesian(&fractional),
                species: cfg.species(),
            };
            match &self.rate_model {
                RateModel::Custom(calculator) => calculator.rate(&ctx),
                RateModel::Fixed => process.rate(),
            }
        };
        self.before_buf = before;
        self.after_buf = after;
        if !rate.is_finite() {
            return Err(Error::RateCalculatorReturn {
                process: process_idx,
                site: gidx,
                value: rate,
            });
        }
        Ok(rate.max(0.0))
    }
}
