// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Process specifications and match lists.
//!
//! A [`ProcessSpec`] is the validated, user-facing description of one
//! elementary process: local coordinates, species before and after, optional
//! site types, optional move vectors, basis-site filter, and flags. A
//! [`MatchEntry`] is one slot of the compiled match list the kernel walks at
//! a candidate site.
//!
//! Canonical order invariant: match lists are sorted by distance from the
//! center ascending, ties broken on (x, y, z). Every process and every
//! neighbourhood listing uses this order, which is what makes implicit
//! wildcard padding a pure insertion.

use trellis_geom::Coordinate;

use crate::error::Error;
use crate::species::{TypeRegistry, WILDCARD, WILDCARD_CODE};

/// One entry of a compiled match list.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEntry {
    /// Offset from the center site, fractional cell units.
    pub offset: Coordinate,
    /// Distance from the center.
    pub distance: f64,
    /// Species code to match; 0 matches anything.
    pub match_type: u32,
    /// Species code to write on application; 0 writes nothing.
    pub update_type: u32,
    /// Site-type code to match; 0 matches anything.
    pub site_type: u32,
    /// Destination entry position when this entry's atom moves.
    pub move_to: Option<usize>,
    /// Fractional displacement of the moving atom.
    pub move_vector: Option<Coordinate>,
}

impl MatchEntry {
    /// `true` when this entry carries an atomic move.
    pub fn has_move(&self) -> bool {
        self.move_to.is_some()
    }

    fn wildcard(offset: Coordinate) -> Self {
        Self {
            offset,
            distance: offset.norm(),
            match_type: WILDCARD_CODE,
            update_type: WILDCARD_CODE,
            site_type: WILDCARD_CODE,
            move_to: None,
            move_vector: None,
        }
    }
}

/// Canonical match-list ordering: distance ascending, then (x, y, z).
fn canonical_cmp(
    (da, ca): (f64, &Coordinate),
    (db, cb): (f64, &Coordinate),
) -> std::cmp::Ordering {
    da.total_cmp(&db)
        .then_with(|| ca.x.total_cmp(&cb.x))
        .then_with(|| ca.y.total_cmp(&cb.y))
        .then_with(|| ca.z.total_cmp(&cb.z))
}

/// A validated elementary process description.
///
/// Construction performs all the §input checking once: coordinates are
/// centered on the first entry and sorted canonically, wildcard positions
/// are frozen, move vectors are reconstructed or verified, and the flags are
/// cross-checked. After `build()` succeeds the spec is internally consistent
/// and ready for compilation against a configuration's registries.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    coordinates: Vec<Coordinate>,
    before: Vec<String>,
    after: Vec<String>,
    site_types: Option<Vec<String>>,
    move_vectors: Vec<(usize, Coordinate)>,
    basis_sites: Vec<usize>,
    rate: f64,
    fast: bool,
    redist: bool,
    redist_species: String,
}

impl ProcessSpec {
    /// Starts a builder.
    pub fn builder() -> ProcessSpecBuilder {
        ProcessSpecBuilder::default()
    }

    /// Local coordinates, centered and canonically sorted.
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Species names before application, co-sorted with the coordinates.
    pub fn before(&self) -> &[String] {
        &self.before
    }

    /// Species names after application.
    pub fn after(&self) -> &[String] {
        &self.after
    }

    /// Site-type names, when the process is site-typed.
    pub fn site_types(&self) -> Option<&[String]> {
        self.site_types.as_deref()
    }

    /// Move vectors as (entry index, fractional displacement).
    pub fn move_vectors(&self) -> &[(usize, Coordinate)] {
        &self.move_vectors
    }

    /// Basis indices at which the process may apply.
    pub fn basis_sites(&self) -> &[usize] {
        &self.basis_sites
    }

    /// The rate constant.
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

    /// Species scattered by a redistribution process; empty otherwise.
    pub fn redist_species(&self) -> &str {
        &self.redist_species
    }

    /// Compiles the match list against the species and site-type registries.
    ///
    /// Fails when the process references a species absent from the
    /// configuration's possible types, or a site type absent from the sites
    /// map.
    pub fn compile(
        &self,
        species: &TypeRegistry,
        site_types: &TypeRegistry,
    ) -> Result<Vec<MatchEntry>, Error> {
        let mut entries = Vec::with_capacity(self.coordinates.len());
        let mut move_to = vec![None; self.coordinates.len()];
        let mut move_vec = vec![None; self.coordinates.len()];
        for &(from, vector) in &self.move_vectors {
            let target = self.coordinates[from].add(&vector);
            // Validated at build time; resolution cannot fail here.
            let to = self
                .coordinates
                .iter()
                .position(|c| c.is_same_point(&target))
                .ok_or_else(|| Error::validation("move vector no longer resolves"))?;
            move_to[from] = Some(to);
            move_vec[from] = Some(vector);
        }
        for (k, offset) in self.coordinates.iter().enumerate() {
            let match_type = species.require(&self.before[k])?;
            let update_type = species.require(&self.after[k])?;
            let site_type = match &self.site_types {
                None => WILDCARD_CODE,
                Some(names) => site_types.require(&names[k])?,
            };
            entries.push(MatchEntry {
                offset: *offset,
                distance: offset.norm(),
                match_type,
                update_type,
                site_type,
                move_to: move_to[k],
                move_vector: move_vec[k],
            });
        }
        Ok(entries)
    }
}

impl PartialEq for ProcessSpec {
    fn eq(&self, other: &Self) -> bool {
        if self.basis_sites != other.basis_sites
            || self.coordinates.len() != other.coordinates.len()
            || self.before != other.before
            || self.after != other.after
            || self.site_types != other.site_types
            || self.move_vectors.len() != other.move_vectors.len()
        {
            return false;
        }
        let coords_close = self
            .coordinates
            .iter()
            .zip(&other.coordinates)
            .all(|(a, b)| a.distance(b) < 1.0e-5);
        let moves_close = self
            .move_vectors
            .iter()
            .zip(&other.move_vectors)
            .all(|((i, v), (j, w))| i == j && v.is_same_point(w));
        coords_close && moves_close
    }
}

/// Builder for [`ProcessSpec`]; `build()` runs the full validation.
#[derive(Debug, Default, Clone)]
pub struct ProcessSpecBuilder {
    coordinates: Vec<Coordinate>,
    before: Vec<String>,
    after: Vec<String>,
    site_types: Option<Vec<String>>,
    move_vectors: Option<Vec<(usize, Coordinate)>>,
    basis_sites: Vec<usize>,
    rate: f64,
    fast: bool,
    redist: bool,
    redist_species: Option<String>,
}

impl ProcessSpecBuilder {
    /// Local coordinates of the stencil; entry 0 becomes the center.
    pub fn coordinates<C: Into<Coordinate> + Copy>(mut self, coords: &[C]) -> Self {
        self.coordinates = coords.iter().map(|&c| c.into()).collect();
        self
    }

    /// Species before the process applies.
    pub fn before<S: AsRef<str>>(mut self, types: &[S]) -> Self {
        self.before = types.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Species after the process applies.
    pub fn after<S: AsRef<str>>(mut self, types: &[S]) -> Self {
        self.after = types.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Site types the process requires; omit for untyped matching.
    pub fn site_types<S: AsRef<str>>(mut self, types: &[S]) -> Self {
        self.site_types = Some(types.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    /// Explicit move vectors as (entry index, fractional displacement).
    pub fn move_vectors(mut self, moves: &[(usize, Coordinate)]) -> Self {
        self.move_vectors = Some(moves.to_vec());
        self
    }

    /// Basis indices at which the process may apply.
    pub fn basis_sites(mut self, basis: &[usize]) -> Self {
        self.basis_sites = basis.to_vec();
        self
    }

    /// The rate constant; must be finite and positive.
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Marks the process fast.
    pub fn fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    /// Marks the process as a redistribution process scattering `species`.
    ///
    /// Implies `fast` must also be set; checked at build.
    pub fn redist<S: Into<String>>(mut self, species: S) -> Self {
        self.redist = true;
        self.redist_species = Some(species.into());
        self
    }

    /// Validates everything and freezes the spec.
    pub fn build(self) -> Result<ProcessSpec, Error> {
        let n = self.coordinates.len();
        if n == 0 {
            return Err(Error::validation("a process needs at least one site"));
        }
        if self.before.len() != n || self.after.len() != n {
            return Err(Error::validation(format!(
                "types length mismatch: {} coordinates, {} before, {} after",
                n,
                self.before.len(),
                self.after.len()
            )));
        }
        if let Some(st) = &self.site_types {
            if st.len() != n {
                return Err(Error::validation(format!(
                    "site_types length {} does not match {} coordinates",
                    st.len(),
                    n
                )));
            }
        }
        for c in &self.coordinates {
            if !(c.x.is_finite() && c.y.is_finite() && c.z.is_finite()) {
                return Err(Error::validation("coordinates must be finite"));
            }
        }

        // Wildcards are fixed scaffolding: they may appear, but never move.
        let wild_before: Vec<bool> = self.before.iter().map(|t| t == WILDCARD).collect();
        let wild_after: Vec<bool> = self.after.iter().map(|t| t == WILDCARD).collect();
        if wild_before != wild_after {
            return Err(Error::validation(
                "wildcards must not move during a valid process",
            ));
        }
        if self.before == self.after {
            return Err(Error::validation(
                "the configuration before and after a process cannot be identical",
            ));
        }

        if self.redist && !self.fast {
            return Err(Error::validation(
                "a redistribution process must also be flagged fast",
            ));
        }
        let redist_species = match (self.redist, self.redist_species) {
            (true, Some(s)) if !s.is_empty() => s,
            (true, _) => {
                return Err(Error::validation(
                    "redist_species must be given for a redistribution process",
                ))
            }
            (false, Some(_)) => {
                return Err(Error::validation(
                    "redist_species is redundant for a non-redistribution process",
                ))
            }
            (false, None) => String::new(),
        };

        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(Error::validation(format!(
                "rate constant must be positive and finite, got {}",
                self.rate
            )));
        }
        if self.basis_sites.is_empty() {
            return Err(Error::validation(
                "the list of basis sites for a process may not be empty",
            ));
        }

        // Center on entry 0.
        let center = self.coordinates[0];
        let coordinates: Vec<Coordinate> =
            self.coordinates.iter().map(|c| c.sub(&center)).collect();

        // Reconstruct or verify the move vectors.
        let move_vectors = match self.move_vectors {
            Some(mv) => {
                Self::verify_moves(&coordinates, &self.before, &self.after, &mv)?;
                mv
            }
            None => Self::reconstruct_moves(&coordinates, &self.before, &self.after),
        };

        // Canonical sort, co-sorting every parallel array.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| {
            canonical_cmp(
                (coordinates[i].norm(), &coordinates[i]),
                (coordinates[j].norm(), &coordinates[j]),
            )
        });
        let mut old_to_new = vec![0usize; n];
        for (new, &old) in order.iter().enumerate() {
            old_to_new[old] = new;
        }
        let permute_strings = |v: &[String]| -> Vec<String> {
            order.iter().map(|&old| v[old].clone()).collect()
        };
        let sorted_coordinates: Vec<Coordinate> =
            order.iter().map(|&old| coordinates[old]).collect();
        let sorted_before = permute_strings(&self.before);
        let sorted_after = permute_strings(&self.after);
        let sorted_site_types = self.site_types.as_deref().map(|st| permute_strings(st));
        let mut sorted_moves: Vec<(usize, Coordinate)> = move_vectors
            .iter()
            .map(|&(old, v)| (old_to_new[old], v))
            .collect();
        sorted_moves.sort_by_key(|&(i, _)| i);

        Ok(ProcessSpec {
            coordinates: sorted_coordinates,
            before: sorted_before,
            after: sorted_after,
            site_types: sorted_site_types,
            move_vectors: sorted_moves,
            basis_sites: self.basis_sites,
            rate: self.rate,
            fast: self.fast,
            redist: self.redist,
            redist_species,
        })
    }

    /// Two differing entries whose species swap yield the canonical pair of
    /// move vectors; anything else means the process moves nothing.
    fn reconstruct_moves(
        coordinates: &[Coordinate],
        before: &[String],
        after: &[String],
    ) -> Vec<(usize, Coordinate)> {
        let differing: Vec<usize> = (0..before.len())
            .filter(|&i| before[i] != after[i])
            .collect();
        if differing.len() != 2 {
            return Vec::new();
        }
        let (i, j) = (differing[0], differing[1]);
        if before[i] != after[j] || before[j] != after[i] {
            return Vec::new();
        }
        let forward = coordinates[j].sub(&coordinates[i]);
        let backward = coordinates[i].sub(&coordinates[j]);
        vec![(i, forward), (j, backward)]
    }

    fn verify_moves(
        coordinates: &[Coordinate],
        before: &[String],
        after: &[String],
        moves: &[(usize, Coordinate)],
    ) -> Result<(), Error> {
        let mut moved: Vec<String> = before.to_vec();
        for &(from, vector) in moves {
            if from >= coordinates.len() {
                return Err(Error::validation(format!(
                    "move vector index {from} is out of range"
                )));
            }
            let target = coordinates[from].add(&vector);
            let Some(to) = coordinates.iter().position(|c| c.is_same_point(&target)) else {
                return Err(Error::validation(
                    "each move vector must move an atom to a site of the process",
                ));
            };
            if before[from] != after[to] {
                return Err(Error::validation(format!(
                    "the move vector for index {from} does not match the types after the move"
                )));
            }
            moved[to] = before[from].clone();
        }
        if moved != after {
            return Err(Error::validation(
                "applying the move vectors to the types before does not yield the types after",
            ));
        }
        Ok(())
    }
}

/// Pads every match list to the union stencil with wildcard entries.
///
/// Offsets are deduplicated with the coordinate tolerance; insertion
/// preserves the canonical order, and move indices are remapped to the new
/// entry positions. This is the pre-expansion form: the runtime walk never
/// inserts wildcards.
pub(crate) fn expand_implicit_wildcards(lists: &mut [Vec<MatchEntry>]) {
    const QUANTUM: f64 = 1.0e-6;
    let key = |c: &Coordinate| -> (i64, i64, i64) {
        (
            (c.x / QUANTUM).round() as i64,
            (c.y / QUANTUM).round() as i64,
            (c.z / QUANTUM).round() as i64,
        )
    };

    let mut union: Vec<Coordinate> = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    for list in lists.iter() {
        for entry in list {
            if seen.insert(key(&entry.offset)) {
                union.push(entry.offset);
            }
        }
    }

    for list in lists.iter_mut() {
        let present: std::collections::BTreeSet<_> =
            list.iter().map(|e| key(&e.offset)).collect();
        let missing: Vec<Coordinate> = union
            .iter()
            .filter(|c| !present.contains(&key(c)))
            .copied()
            .collect();
        if missing.is_empty() {
            continue;
        }
        // Track where the old entries land so move targets can be remapped.
        let old_len = list.len();
        list.extend(missing.into_iter().map(MatchEntry::wildcard));
        let mut order: Vec<usize> = (0..list.len()).collect();
        order.sort_by(|&i, &j| {
            canonical_cmp(
                (list[i].distance, &list[i].offset),
                (list[j].distance, &list[j].offset),
            )
        });
        let mut old_to_new = vec![0usize; list.len()];
        for (new, &old) in order.iter().enumerate() {
            old_to_new[old] = new;
        }
        let mut sorted: Vec<MatchEntry> = order.iter().map(|&old| list[old].clone()).collect();
        for entry in &mut sorted {
            if let Some(to) = entry.move_to {
                debug_assert!(to < old_len);
                entry.move_to = Some(old_to_new[to]);
            }
        }
        *list = sorted;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn coords2() -> Vec<Coordinate> {
        vec![Coordinate::origin(), Coordinate::new(1.0, 0.0, 0.0)]
    }

    fn flip_spec() -> ProcessSpec {
        ProcessSpec::builder()
            .coordinates(&[[0.0, 0.0, 0.0]])
            .before(&["A"])
            .after(&["B"])
            .basis_sites(&[0])
            .rate(1.5)
            .build()
            .unwrap()
    }

    #[test]
    fn centering_moves_entry_zero_to_origin() {
        let spec = ProcessSpec::builder()
            .coordinates(&[[1.0, 1.0, 0.0], [2.0, 1.0, 0.0]])
            .before(&["A", "B"])
            .after(&["B", "A"])
            .basis_sites(&[0])
            .rate(1.0)
            .build()
            .unwrap();
        assert_eq!(spec.coordinates()[0], Coordinate::origin());
        assert_eq!(spec.coordinates()[1], Coordinate::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn swap_reconstructs_move_vectors() {
        let spec = ProcessSpec::builder()
            .coordinates(&coords2())
            .before(&["A", "B"])
            .after(&["B", "A"])
            .basis_sites(&[0])
            .rate(1.0)
            .build()
            .unwrap();
        let moves = spec.move_vectors();
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].0, 0);
        assert_eq!(moves[0].1, Coordinate::new(1.0, 0.0, 0.0));
        assert_eq!(moves[1].0, 1);
        assert_eq!(moves[1].1, Coordinate::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn pure_flip_has_no_moves() {
        assert!(flip_spec().move_vectors().is_empty());
    }

    #[test]
    fn moving_wildcards_is_rejected() {
        let err = ProcessSpec::builder()
            .coordinates(&coords2())
            .before(&["*", "B"])
            .after(&["B", "*"])
            .basis_sites(&[0])
            .rate(1.0)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn identical_before_after_is_rejected() {
        let err = ProcessSpec::builder()
            .coordinates(&coords2())
            .before(&["A", "B"])
            .after(&["A", "B"])
            .basis_sites(&[0])
            .rate(1.0)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn bad_explicit_moves_are_rejected() {
        let err = ProcessSpec::builder()
            .coordinates(&coords2())
            .before(&["A", "B"])
            .after(&["B", "A"])
            .move_vectors(&[(0, Coordinate::new(0.5, 0.0, 0.0))])
            .basis_sites(&[0])
            .rate(1.0)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn redist_requires_fast_flag() {
        let err = ProcessSpec::builder()
            .coordinates(&coords2())
            .before(&["A", "V"])
            .after(&["V", "A"])
            .redist("A")
            .fast(false)
            .basis_sites(&[0])
            .rate(1.0)
            .build();
        // `redist()` implies fast; explicitly clearing it afterwards loses.
        assert!(err.is_err());
    }

    #[test]
    fn nonpositive_rate_is_rejected() {
        for rate in [0.0, -2.0, f64::NAN] {
            let err = ProcessSpec::builder()
                .coordinates(&coords2())
                .before(&["A", "B"])
                .after(&["B", "A"])
                .basis_sites(&[0])
                .rate(rate)
                .build();
            assert!(err.is_err(), "rate {rate} accepted");
        }
    }

    #[test]
    fn canonical_sort_orders_by_distance_then_components() {
        let spec = ProcessSpec::builder()
            .coordinates(&[
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [-1.0, 0.0, 0.0],
            ])
            .before(&["A", "B", "C", "C"])
            .after(&["B", "A", "C", "C"])
            .basis_sites(&[0])
            .rate(1.0)
            .build()
            .unwrap();
        let distances: Vec<f64> = spec.coordinates().iter().map(Coordinate::norm).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        // Ties at distance 1 resolve by x: (-1,0,0) before (0,1,0).
        assert_eq!(spec.coordinates()[1], Coordinate::new(-1.0, 0.0, 0.0));
        assert_eq!(spec.coordinates()[2], Coordinate::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn compile_maps_species_and_wildcards() {
        let species = TypeRegistry::new(&["A", "B"]).unwrap();
        let sites = TypeRegistry::new(&["ridge"]).unwrap();
        let spec = ProcessSpec::builder()
            .coordinates(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])
            .before(&["A", "*"])
            .after(&["B", "*"])
            .basis_sites(&[0])
            .rate(1.0)
            .build()
            .unwrap();
        let list = spec.compile(&species, &sites).unwrap();
        assert_eq!(list[0].match_type, 1);
        assert_eq!(list[0].update_type, 2);
        assert_eq!(list[1].match_type, WILDCARD_CODE);
        assert_eq!(list[1].update_type, WILDCARD_CODE);
    }

    #[test]
    fn compile_rejects_unknown_species() {
        let species = TypeRegistry::new(&["A"]).unwrap();
        let sites = TypeRegistry::new::<&str>(&[]).unwrap();
        let spec = flip_spec();
        assert!(spec.compile(&species, &sites).is_err());
    }

    #[test]
    fn implicit_wildcards_pad_to_union_stencil() {
        let species = TypeRegistry::new(&["A", "B"]).unwrap();
        let sites = TypeRegistry::new::<&str>(&[]).unwrap();
        let small = flip_spec().compile(&species, &sites).unwrap();
        let big = ProcessSpec::builder()
            .coordinates(&[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [-1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, -1.0, 0.0],
            ])
            .before(&["A", "B", "B", "B", "B"])
            .after(&["B", "B", "B", "B", "A"])
            .basis_sites(&[0])
            .rate(2.0)
            .build()
            .unwrap()
            .compile(&species, &sites)
            .unwrap();
        let mut lists = [small, big];
        expand_implicit_wildcards(&mut lists);
        assert_eq!(lists[0].len(), 5);
        assert_eq!(lists[1].len(), 5);
        let padded: Vec<_> = lists[0]
            .iter()
            .filter(|e| e.match_type == WILDCARD_CODE)
            .collect();
        assert_eq!(padded.len(), 4);
        assert!(padded.iter().all(|e| e.update_type == WILDCARD_CODE));
        // Canonical order is preserved after insertion.
        let d: Vec<f64> = lists[0].iter().map(|e| e.distance).collect();
        assert!(d.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn wildcard_padding_remaps_move_targets() {
        let species = TypeRegistry::new(&["A", "B", "C"]).unwrap();
        let sites = TypeRegistry::new::<&str>(&[]).unwrap();
        let swap = ProcessSpec::builder()
            .coordinates(&coords2())
            .before(&["A", "B"])
            .after(&["B", "A"])
            .basis_sites(&[0])
            .rate(1.0)
            .build()
            .unwrap()
            .compile(&species, &sites)
            .unwrap();
        let wide = ProcessSpec::builder()
            .coordinates(&[[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [1.0, 0.0, 0.0]])
            .before(&["A", "C", "B"])
            .after(&["B", "C", "A"])
            .basis_sites(&[0])
            .rate(1.0)
            .build()
            .unwrap()
            .compile(&species, &sites)
            .unwrap();
        let mut lists = [swap, wide];
        expand_implicit_wildcards(&mut lists);
        // The swap process gained the 0.5 offset; its center move now points
        // at the entry that sits two slots out.
        assert_eq!(lists[0].len(), 3);
        let center = &lists[0][0];
        let to = center.move_to.unwrap();
        assert_eq!(lists[0][to].offset, Coordinate::new(1.0, 0.0, 0.0));
    }
}
