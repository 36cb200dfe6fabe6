// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! On-the-fly analysis plugins.

use crate::config::Configuration;
use crate::error::Error;
use crate::interactions::Interactions;

/// Observer invoked at configured points of the step loop.
///
/// All three hooks default to no-ops. Plugins receive read-only views; they
/// never mutate the configuration or the processes. An error from `setup` or
/// `register_step` aborts the run, but `finalize` still runs for every
/// plugin that saw `setup`.
pub trait AnalysisPlugin {
    /// Called once right before the step loop starts.
    fn setup(
        &mut self,
        step: u64,
        time: f64,
        cfg: &Configuration,
        interactions: &Interactions,
    ) -> Result<(), Error> {
        let _ = (step, time, cfg, interactions);
        Ok(())
    }

    /// Called after each step the plugin's interval selects.
    fn register_step(
        &mut self,
        step: u64,
        time: f64,
        cfg: &Configuration,
        interactions: &Interactions,
    ) -> Result<(), Error> {
        let _ = (step, time, cfg, interactions);
        Ok(())
    }

    /// Called after the loop, on every exit path.
    fn finalize(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
