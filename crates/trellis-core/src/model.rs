// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The lattice model driver: the kMC step loop.
//!
//! Loop contract:
//! - Frame 0 is emitted before any plugin sees `setup`.
//! - For a given step, the trajectory frame is emitted before the analysis
//!   plugins run.
//! - A redistribution pass does not consume a kMC step and does not advance
//!   the clock.
//! - The trajectory flush and every registered plugin's `finalize` run on
//!   every exit path: normal completion, early termination, and fatal
//!   errors.

use tracing::{debug, info, warn};
use trellis_geom::Lattice;

use crate::config::Configuration;
use crate::control::{AnalysisInterval, ControlParameters, DistributorKind, IntervalSpec};
use crate::distributor::{process_random, split_random, RedistributionContext};
use crate::error::Error;
use crate::interactions::Interactions;
use crate::lattice_map::LatticeMap;
use crate::plugin::AnalysisPlugin;
use crate::prng::SimRng;
use crate::sitesmap::SitesMap;
use crate::timer::SimulationTimer;
use crate::trajectory::TrajectorySink;

/// The central simulation object: configuration, sites map, and
/// interactions united over one lattice.
#[derive(Debug)]
pub struct LatticeModel {
    lattice: Lattice,
    map: LatticeMap,
    cfg: Configuration,
    sites: SitesMap,
    interactions: Interactions,
    timer: SimulationTimer,
}

impl LatticeModel {
    /// Builds the model and runs the initial full matching.
    ///
    /// Fails when the configuration or sites map does not cover the lattice,
    /// or when a process cannot be compiled against it.
    pub fn new(
        lattice: Lattice,
        cfg: Configuration,
        sites: SitesMap,
        mut interactions: Interactions,
    ) -> Result<Self, Error> {
        if cfg.n_sites() != lattice.n_sites() {
            return Err(Error::validation(format!(
                "configuration covers {} sites but the lattice has {}",
                cfg.n_sites(),
                lattice.n_sites()
            )));
        }
        if sites.n_sites() != lattice.n_sites() {
            return Err(Error::validation(format!(
                "sites map covers {} sites but the lattice has {}",
                sites.n_sites(),
                lattice.n_sites()
            )));
        }
        let map = LatticeMap::new(
            lattice.repetitions(),
            lattice.n_basis(),
            lattice.periodicity(),
        );
        interactions.build(&cfg, &sites, &lattice, &map)?;
        Ok(Self {
            lattice,
            map,
            cfg,
            sites,
            interactions,
            timer: SimulationTimer::new(0.0),
        })
    }

    /// The lattice geometry.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// The current configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.cfg
    }

    /// The interactions arena.
    pub fn interactions(&self) -> &Interactions {
        &self.interactions
    }

    /// Current simulation time.
    pub fn simulation_time(&self) -> f64 {
        self.timer.time()
    }

    /// Runs the kMC loop under `control`.
    ///
    /// `trajectory` receives frames at the configured cadences; passing
    /// `None` runs without trajectory output. Plugins are dispatched at
    /// their analysis intervals. On return — success or failure — the sink
    /// has been flushed and every plugin that saw `setup` has been
    /// finalized.
    pub fn run(
        &mut self,
        control: &ControlParameters,
        mut trajectory: Option<&mut dyn TrajectorySink>,
        plugins: &mut [Box<dyn AnalysisPlugin>],
    ) -> Result<(), Error> {
        let mut rng = SimRng::new(control.rng_kind(), control.seed())?;
        self.timer = SimulationTimer::new(control.start_time());
        if trajectory.is_none() {
            warn!("no trajectory sink given; frames will not be saved");
        }

        let mut setup_count = 0usize;
        let result = self.step_loop(control, &mut trajectory, plugins, &mut rng, &mut setup_count);

        // Scoped teardown: flush and finalize on every exit path.
        let flush_result = trajectory.as_mut().map_or(Ok(()), |sink| sink.flush());
        let mut finalize_result = Ok(());
        for plugin in plugins[..setup_count].iter_mut() {
            if let Err(err) = plugin.finalize() {
                warn!(error = %err, "plugin finalize failed");
                if finalize_result.is_ok() {
                    finalize_result = Err(err);
                }
            }
        }
        if result.is_err() {
            if let Err(flush_err) = flush_result {
                warn!(error = %flush_err, "trajectory flush failed during teardown");
            }
            return result;
        }
        flush_result?;
        finalize_result
    }

    fn step_loop(
        &mut self,
        control: &ControlParameters,
        trajectory: &mut Option<&mut dyn TrajectorySink>,
        plugins: &mut [Box<dyn AnalysisPlugin>],
        rng: &mut SimRng,
        setup_count: &mut usize,
    ) -> Result<(), Error> {
        let intervals: Vec<IntervalSpec> = match control.analysis_interval() {
            AnalysisInterval::Every(n) => vec![IntervalSpec::Every(*n); plugins.len()],
            AnalysisInterval::PerPlugin(specs) => {
                if specs.len() != plugins.len() {
                    return Err(Error::validation(format!(
                        "{} analysis intervals for {} plugins",
                        specs.len(),
                        plugins.len()
                    )));
                }
                specs.clone()
            }
        };

        Self::emit(trajectory, 0, self.timer.time(), &self.cfg)?;
        for (i, plugin) in plugins.iter_mut().enumerate() {
            plugin.setup(0, self.timer.time(), &self.cfg, &self.interactions)?;
            *setup_count = i + 1;
        }

        if self.interactions.total_available_sites() == 0 {
            return Err(Error::NoAvailableProcess { step: 0 });
        }

        let n_steps = control.number_of_steps();
        info!(
            steps = n_steps,
            start_time = self.timer.time(),
            "running kMC loop"
        );

        let mut step: u64 = 0;
        let mut n_redistributions: u64 = 0;
        let mut last_redistribution: u64 = 0;
        while step < n_steps {
            step += 1;

            if control.do_redistribution()
                && step % control.redistribution_interval() == 0
                && step != last_redistribution
            {
                // A redistribution pass is not a kMC step: rewind the
                // counter and re-enter the loop.
                last_redistribution = step;
                step -= 1;
                let affected = self.redistribute(control, rng)?;
                n_redistributions += 1;
                self.timer.advance_zero();
                debug!(
                    step,
                    affected = affected.len(),
                    pass = n_redistributions,
                    "redistribution"
                );
                if n_redistributions % control.redist_dump_interval() == 0 {
                    Self::emit(trajectory, step, self.timer.time(), &self.cfg)?;
                }
                continue;
            }

            let Some((process_idx, site)) = self.interactions.pick(rng) else {
                return Err(Error::NoAvailableProcess { step });
            };
            let process = self.interactions.process(process_idx);
            self.cfg.perform_move(process, site, &self.map);
            self.interactions.update_matching(
                &self.cfg,
                &self.sites,
                &self.lattice,
                &self.map,
                self.cfg.last_updated_sites(),
            )?;
            let total_rate = self.interactions.total_rate();
            if total_rate <= 0.0 {
                return Err(Error::NoAvailableProcess { step });
            }
            self.timer.advance(total_rate, rng);

            if step % control.dump_interval() == 0 {
                let percent = step * 100 / n_steps;
                info!(
                    "[{percent:>3}%] {step} steps executed. time: {:<20.10e} delta: {:<20.10e}",
                    self.timer.time(),
                    self.timer.delta()
                );
                Self::emit(trajectory, step, self.timer.time(), &self.cfg)?;
            }
            if let Some(window) = control.extra_traj() {
                if (window.start..=window.end).contains(&step) && step % window.interval == 0 {
                    Self::emit(trajectory, step, self.timer.time(), &self.cfg)?;
                }
            }
            for (spec, plugin) in intervals.iter().zip(plugins.iter_mut()) {
                if spec.triggers(step) {
                    plugin.register_step(
                        step,
                        self.timer.time(),
                        &self.cfg,
                        &self.interactions,
                    )?;
                }
            }

            if self.timer.time() > control.time_limit() {
                info!(step, time = self.timer.time(), "time limit reached");
                break;
            }
        }
        Ok(())
    }

    fn emit(
        trajectory: &mut Option<&mut dyn TrajectorySink>,
        step: u64,
        time: f64,
        cfg: &Configuration,
    ) -> Result<(), Error> {
        match trajectory {
            Some(sink) => sink.append(step, time, cfg),
            None => Ok(()),
        }
    }

    /// Runs one redistribution pass under `control`'s distributor settings
    /// and returns the sorted affected site indices.
    ///
    /// The step loop calls this at the configured cadence; it is public so
    /// hosts can trigger an extra pass between runs. Matching is rebuilt
    /// from scratch before it returns.
    pub fn redistribute(
        &mut self,
        control: &ControlParameters,
        rng: &mut SimRng,
    ) -> Result<Vec<usize>, Error> {
        let slow = control
            .slow_indices()
            .map_or_else(Vec::new, |f| f(&self.cfg));
        let mut ctx = RedistributionContext {
            cfg: &mut self.cfg,
            sites: &self.sites,
            interactions: &mut self.interactions,
            lattice: &self.lattice,
            map: &self.map,
            rng,
        };
        match control.distributor() {
            DistributorKind::SplitRandom => split_random(
                &mut ctx,
                control.fast_species(),
                control.nsplits(),
                &slow,
            ),
            DistributorKind::ProcessRandom => {
                process_random(&mut ctx, control.empty_element().unwrap_or_default())
            }
        }
    }
}
