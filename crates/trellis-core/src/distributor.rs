// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Redistribution: bulk reshuffling of fast species.
//!
//! Two variants. The split-box distributor permutes `(species, atom id)`
//! pairs of the designated fast species inside equal sub-boxes, conserving
//! the species multiset of every sub-box exactly. The per-process
//! distributor extracts each redistribution species to the vacancy element
//! and re-scatters it through the processes flagged `redist`; conservation
//! is not promised there.
//!
//! Both variants end with a full re-matching pass: after a bulk shuffle the
//! inverse stencil offers no useful locality.

use rand::seq::SliceRandom;
use rand::Rng;
use trellis_geom::Lattice;

use crate::config::Configuration;
use crate::error::Error;
use crate::interactions::Interactions;
use crate::lattice_map::LatticeMap;
use crate::prng::SimRng;
use crate::sitesmap::SitesMap;

/// Shared context the distributors operate in.
pub(crate) struct RedistributionContext<'a> {
    pub cfg: &'a mut Configuration,
    pub sites: &'a SitesMap,
    pub interactions: &'a mut Interactions,
    pub lattice: &'a Lattice,
    pub map: &'a LatticeMap,
    pub rng: &'a mut SimRng,
}

/// Sub-box ordinal of a cell under the `(sa, sb, sc)` split grid.
fn sub_box_of(
    map: &LatticeMap,
    a: usize,
    b: usize,
    c: usize,
    nsplits: (usize, usize, usize),
) -> usize {
    let (n_a, n_b, n_c) = map.repetitions();
    let (sa, sb, sc) = nsplits;
    let box_a = a * sa / n_a;
    let box_b = b * sb / n_b;
    let box_c = c * sc / n_c;
    (box_a * sb + box_b) * sc + box_c
}

/// Split-box random redistribution.
///
/// Within each sub-box, the sites holding a fast species (minus the pinned
/// slow indices) have their `(species, atom id)` pairs shuffled in place.
/// Returns the sorted list of shuffled site indices.
pub(crate) fn split_random(
    ctx: &mut RedistributionContext<'_>,
    fast_species: &[String],
    nsplits: (usize, usize, usize),
    slow_indices: &[usize],
) -> Result<Vec<usize>, Error> {
    let species = ctx.cfg.species();
    let mut fast_codes = Vec::with_capacity(fast_species.len());
    for name in fast_species {
        fast_codes.push(species.require(name)?);
    }

    let (sa, sb, sc) = nsplits;
    let n_boxes = sa * sb * sc;
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); n_boxes];
    for gidx in 0..ctx.map.n_sites() {
        if slow_indices.contains(&gidx) {
            continue;
        }
        if !fast_codes.contains(&ctx.cfg.type_at(gidx)) {
            continue;
        }
        let addr = ctx.map.address_of(gidx);
        buckets[sub_box_of(ctx.map, addr.a, addr.b, addr.c, nsplits)].push(gidx);
    }

    let mut affected = Vec::new();
    for bucket in &buckets {
        if bucket.len() < 2 {
            affected.extend_from_slice(bucket);
            continue;
        }
        let mut pairs: Vec<(u32, u32)> = bucket
            .iter()
            .map(|&g| (ctx.cfg.type_at(g), ctx.cfg.atom_id_at(g)))
            .collect();
        pairs.shuffle(ctx.rng);
        for (&g, &(code, id)) in bucket.iter().zip(&pairs) {
            ctx.cfg.set_site(g, code, id);
        }
        affected.extend_from_slice(bucket);
    }
    affected.sort_unstable();

    ctx.interactions
        .rebuild_from_scratch(ctx.cfg, ctx.sites, ctx.lattice, ctx.map)?;
    Ok(affected)
}

/// Per-process random redistribution.
///
/// For every process flagged `redist`: extract its redistribution species to
/// the vacancy element, then re-apply the process at randomly chosen
/// available sites until as many placements happened as extractions (or no
/// candidate remains). Returns the sorted list of touched site indices.
pub(crate) fn process_random(
    ctx: &mut RedistributionContext<'_>,
    empty_element: &str,
) -> Result<Vec<usize>, Error> {
    let empty_code = ctx.cfg.species().require(empty_element)?;
    let redist_ids: Vec<usize> = ctx
        .interactions
        .processes()
        .iter()
        .filter(|p| p.redist())
        .map(|p| p.id())
        .collect();

    let mut affected = Vec::new();
    for id in redist_ids {
        let target_code = ctx.interactions.process(id).redist_species();

        // Extraction: every site holding the species becomes a vacancy.
        let mut extracted = 0usize;
        for gidx in 0..ctx.map.n_sites() {
            if ctx.cfg.type_at(gidx) == target_code {
                let atom_id = ctx.cfg.atom_id_at(gidx);
                ctx.cfg.set_site(gidx, empty_code, atom_id);
                affected.push(gidx);
                extracted += 1;
            }
        }
        ctx.interactions
            .rebuild_from_scratch(ctx.cfg, ctx.sites, ctx.lattice, ctx.map)?;

        // Re-scatter: apply the process at random candidates until the
        // extracted count is placed back or candidates run out.
        let mut placed = 0usize;
        while placed < extracted {
            let n_candidates = ctx.interactions.process(id).available().len();
            if n_candidates == 0 {
                break;
            }
            let slot = ctx.rng.gen_range(0..n_candidates);
            let gidx = ctx.interactions.process(id).available().get(slot);
            {
                let process = ctx.interactions.process(id);
                ctx.cfg.perform_move(process, gidx, ctx.map);
            }
            affected.extend_from_slice(ctx.cfg.last_updated_sites());
            let updated: Vec<usize> = ctx.cfg.last_updated_sites().to_vec();
            ctx.interactions
                .update_matching(ctx.cfg, ctx.sites, ctx.lattice, ctx.map, &updated)?;
            placed += 1;
        }
    }

    affected.sort_unstable();
    affected.dedup();
    ctx.interactions
        .rebuild_from_scratch(ctx.cfg, ctx.sites, ctx.lattice, ctx.map)?;
    Ok(affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn sub_boxes_partition_the_cell_grid() {
        let map = LatticeMap::new((4, 4, 4), 2, [true; 3]);
        let splits = (2, 2, 2);
        let mut counts = vec![0usize; 8];
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    counts[sub_box_of(&map, a, b, c, splits)] += 1;
                }
            }
        }
        assert_eq!(counts, vec![8; 8]);
    }

    #[test]
    fn trivial_split_grid_is_one_box() {
        let map = LatticeMap::new((3, 5, 7), 1, [true; 3]);
        for a in 0..3 {
            for b in 0..5 {
                for c in 0..7 {
                    assert_eq!(sub_box_of(&map, a, b, c, (1, 1, 1)), 0);
                }
            }
        }
    }
}
