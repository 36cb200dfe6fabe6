// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error kinds surfaced by the simulation core.

use thiserror::Error;

/// Every failure the core can report.
///
/// Nothing in the core swallows an error: construction problems surface as
/// [`Error::Validation`] before a run starts, and anything raised inside the
/// step loop aborts the run after the scoped teardown (trajectory flush,
/// plugin finalization) has executed. There is no per-step retry; a run is
/// deterministic given its inputs, so a failure would simply repeat.
#[derive(Debug, Error)]
pub enum Error {
    /// User input is inconsistent (bad move vectors, moving wildcards,
    /// non-positive rates, malformed control parameters, …). Fatal at
    /// construction.
    #[error("validation error: {0}")]
    Validation(String),

    /// The total rate reached zero during the step loop: no process matches
    /// anywhere. Fatal; names the last completed step.
    #[error("no available process at step {step}: the total rate is zero")]
    NoAvailableProcess {
        /// The last completed kMC step.
        step: u64,
    },

    /// The DEVICE generator was requested on a system without a working
    /// nondeterministic source. Fatal at loop start.
    #[error("the DEVICE random number generator is not supported on this system")]
    UnsupportedPrng,

    /// A custom rate calculator returned NaN, an infinity, or (before
    /// clamping applies) something else unusable. Fatal; names the calling
    /// process and site.
    #[error("rate calculator returned {value} for process {process} at site {site}")]
    RateCalculatorReturn {
        /// Index of the process whose rate was being evaluated.
        process: usize,
        /// Global index of the site.
        site: usize,
        /// The offending return value.
        value: f64,
    },

    /// A trajectory write failed. Bubbled to the caller; the loop does not
    /// retry.
    #[error("trajectory I/O error")]
    TrajectoryIo(#[from] std::io::Error),

    /// An analysis plugin failed. Bubbled; `finalize` still runs for every
    /// plugin registered so far.
    #[error("analysis plugin error: {0}")]
    Plugin(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with a formatted message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
