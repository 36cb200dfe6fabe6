// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Trajectory sinks: the lattice and xyz text formats.
//!
//! Frames are buffered in memory and written through when the buffer grows
//! past a fixed size, at the driver's `flush`, or on drop. A frame is always
//! written as one contiguous string, never interleaved.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use trellis_geom::Lattice;

use crate::config::Configuration;
use crate::error::Error;

/// Flush threshold for the in-memory frame buffer.
const MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// C-style `%.*e` formatting: two-digit signed exponent, unlike Rust's
/// bare `{:e}`.
pub(crate) fn format_e(value: f64, precision: usize) -> String {
    let s = format!("{value:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            format!("{mantissa}e{exp:+03}")
        }
        None => s,
    }
}

/// Something that receives `(step, time, configuration)` frames.
pub trait TrajectorySink {
    /// Appends one frame. Emitted atomically with respect to the file.
    fn append(&mut self, step: u64, time: f64, cfg: &Configuration) -> Result<(), Error>;

    /// Writes every buffered frame through to the backing store.
    fn flush(&mut self) -> Result<(), Error>;
}

/// The lattice trajectory format: per-site species strings per frame.
#[derive(Debug)]
pub struct LatticeTrajectoryWriter {
    out: BufWriter<File>,
    pending: String,
}

impl LatticeTrajectoryWriter {
    /// Creates the file and writes the site-coordinate header.
    pub fn create<P: AsRef<Path>>(path: P, lattice: &Lattice) -> Result<Self, Error> {
        let mut out = BufWriter::new(File::create(path)?);
        let sites = lattice.cartesian_sites();
        writeln!(out, "# Trellis lattice trajectory")?;
        writeln!(out, "version=\"2013.10.15\"")?;
        write!(out, "sites=[")?;
        for (i, site) in sites.iter().enumerate() {
            let sep = if i == 0 { "" } else { ",\n       " };
            write!(
                out,
                "{sep}[{},{},{}]",
                format_e(site.x, 6),
                format_e(site.y, 6),
                format_e(site.z, 6)
            )?;
        }
        writeln!(out, "]")?;
        writeln!(out, "times=[]")?;
        writeln!(out, "steps=[]")?;
        writeln!(out, "types=[]")?;
        out.flush()?;
        Ok(Self {
            out,
            pending: String::new(),
        })
    }

    fn write_pending(&mut self) -> Result<(), Error> {
        if !self.pending.is_empty() {
            self.out.write_all(self.pending.as_bytes())?;
            self.pending.clear();
            self.out.flush()?;
        }
        Ok(())
    }
}

impl TrajectorySink for LatticeTrajectoryWriter {
    fn append(&mut self, step: u64, time: f64, cfg: &Configuration) -> Result<(), Error> {
        use std::fmt::Write as _;
        let mut frame = String::new();
        let _ = writeln!(frame, "times.append({})", format_e(time, 10));
        let _ = writeln!(frame, "steps.append({step})");
        let _ = write!(frame, "types.append([");
        for (i, name) in cfg.elements().iter().enumerate() {
            let sep = if i == 0 { "" } else { "," };
            let _ = write!(frame, "{sep}\"{name}\"");
        }
        let _ = writeln!(frame, "])");
        self.pending.push_str(&frame);
        if self.pending.len() > MAX_BUFFER_BYTES {
            self.write_pending()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.write_pending()
    }
}

impl Drop for LatticeTrajectoryWriter {
    fn drop(&mut self) {
        let _ = self.write_pending();
    }
}

/// The xyz trajectory format: per-atom species and world coordinates.
#[derive(Debug)]
pub struct XyzTrajectoryWriter {
    out: BufWriter<File>,
    pending: String,
}

impl XyzTrajectoryWriter {
    /// Creates the file and writes the cell preamble.
    pub fn create<P: AsRef<Path>>(path: P, lattice: &Lattice) -> Result<Self, Error> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "KMCLib XYZ FORMAT VERSION 2013.10.15")?;
        writeln!(out)?;
        writeln!(out, "CELL VECTORS")?;
        let cell = lattice.cell();
        for (label, v) in [("a", cell.a), ("b", cell.b), ("c", cell.c)] {
            writeln!(
                out,
                "{label}: {} {} {}",
                format_e(v.x, 10),
                format_e(v.y, 10),
                format_e(v.z, 10)
            )?;
        }
        writeln!(out)?;
        let (na, nb, nc) = lattice.repetitions();
        writeln!(out, "REPETITIONS {na} {nb} {nc}")?;
        let p = lattice.periodicity();
        writeln!(out, "PERIODICITY {} {} {}", p[0], p[1], p[2])?;
        writeln!(out)?;
        out.flush()?;
        Ok(Self {
            out,
            pending: String::new(),
        })
    }

    fn write_pending(&mut self) -> Result<(), Error> {
        if !self.pending.is_empty() {
            self.out.write_all(self.pending.as_bytes())?;
            self.pending.clear();
            self.out.flush()?;
        }
        Ok(())
    }
}

impl TrajectorySink for XyzTrajectoryWriter {
    fn append(&mut self, step: u64, time: f64, cfg: &Configuration) -> Result<(), Error> {
        use std::fmt::Write as _;
        let species = cfg.atom_id_elements();
        let coords = cfg.atom_id_coordinates();
        let mut frame = String::new();
        let _ = writeln!(frame, "STEP {step}");
        let _ = writeln!(frame, "          {}", species.len());
        let _ = writeln!(frame, "TIME {}", format_e(time, 10));
        for (id, (name, coord)) in species.iter().zip(&coords).enumerate() {
            let _ = writeln!(
                frame,
                "   {name}   {} {} {}  {id}",
                format_e(coord.x, 10),
                format_e(coord.y, 10),
                format_e(coord.z, 10)
            );
        }
        self.pending.push_str(&frame);
        if self.pending.len() > MAX_BUFFER_BYTES {
            self.write_pending()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.write_pending()
    }
}

impl Drop for XyzTrajectoryWriter {
    fn drop(&mut self) {
        let _ = self.write_pending();
    }
}
