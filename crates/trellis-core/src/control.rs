// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Control parameters: everything that steers a run.

use crate::config::Configuration;
use crate::error::Error;
use crate::prng::RngKind;

/// When an analysis plugin fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalSpec {
    /// Every `n` steps.
    Every(u64),
    /// Every `interval` steps while `start <= step <= end`.
    Window {
        /// First step of the window.
        start: u64,
        /// Last step of the window (inclusive).
        end: u64,
        /// Step stride inside the window.
        interval: u64,
    },
}

impl IntervalSpec {
    /// `true` when the spec fires at `step`.
    pub fn triggers(&self, step: u64) -> bool {
        match *self {
            Self::Every(n) => step % n == 0,
            Self::Window {
                start,
                end,
                interval,
            } => (start..=end).contains(&step) && step % interval == 0,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        match *self {
            Self::Every(n) if n == 0 => {
                Err(Error::validation("analysis interval must be positive"))
            }
            Self::Window {
                start,
                end,
                interval,
            } if interval == 0 || start >= end || interval > end - start => Err(
                Error::validation(format!(
                    "bad analysis window ({start}, {end}, {interval})"
                )),
            ),
            _ => Ok(()),
        }
    }
}

/// Scalar-or-per-plugin analysis cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInterval {
    /// One cadence shared by every plugin.
    Every(u64),
    /// One spec per plugin, positionally matched.
    PerPlugin(Vec<IntervalSpec>),
}

impl Default for AnalysisInterval {
    fn default() -> Self {
        Self::Every(1)
    }
}

/// Auxiliary trajectory emission window `(start, end, interval)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraTrajWindow {
    /// First step of the window.
    pub start: u64,
    /// Last step of the window (inclusive).
    pub end: u64,
    /// Step stride inside the window.
    pub interval: u64,
}

/// Which redistribution variant runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistributorKind {
    /// Split-box shuffle of fast species; conserves species per sub-box.
    #[default]
    SplitRandom,
    /// Re-scatter through the `redist` processes; no conservation.
    ProcessRandom,
}

impl std::fmt::Display for DistributorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SplitRandom => "SplitRandomDistributor",
            Self::ProcessRandom => "ProcessRandomDistributor",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for DistributorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SplitRandomDistributor" => Ok(Self::SplitRandom),
            "ProcessRandomDistributor" => Ok(Self::ProcessRandom),
            other => Err(Error::validation(format!(
                "unknown distributor_type '{other}'; supported: SplitRandomDistributor, \
                 ProcessRandomDistributor"
            ))),
        }
    }
}

/// Hook returning extra site indices pinned during split-box
/// redistribution.
pub type SlowIndicesFn = fn(&Configuration) -> Vec<usize>;

/// Validated control parameters for a run.
///
/// Defaults: zero steps (a run must ask for work explicitly), no time limit,
/// dump every step, analysis every step, Mersenne-Twister with seed 1, no
/// redistribution.
#[derive(Debug, Clone)]
pub struct ControlParameters {
    pub(crate) number_of_steps: u64,
    pub(crate) time_limit: f64,
    pub(crate) dump_interval: u64,
    pub(crate) analysis_interval: AnalysisInterval,
    pub(crate) start_time: f64,
    pub(crate) seed: u64,
    pub(crate) rng_kind: RngKind,
    pub(crate) extra_traj: Option<ExtraTrajWindow>,
    pub(crate) do_redistribution: bool,
    pub(crate) redistribution_interval: u64,
    pub(crate) fast_species: Vec<String>,
    pub(crate) nsplits: (usize, usize, usize),
    pub(crate) distributor: DistributorKind,
    pub(crate) empty_element: Option<String>,
    pub(crate) redist_dump_interval: u64,
    pub(crate) slow_indices: Option<SlowIndicesFn>,
}

impl ControlParameters {
    /// Starts a builder with the defaults above.
    pub fn builder() -> ControlParametersBuilder {
        ControlParametersBuilder::default()
    }

    /// Upper bound on kMC steps.
    pub fn number_of_steps(&self) -> u64 {
        self.number_of_steps
    }

    /// Upper bound on simulation time.
    pub fn time_limit(&self) -> f64 {
        self.time_limit
    }

    /// Trajectory dump cadence.
    pub fn dump_interval(&self) -> u64 {
        self.dump_interval
    }

    /// Analysis cadence.
    pub fn analysis_interval(&self) -> &AnalysisInterval {
        &self.analysis_interval
    }

    /// Initial clock value.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// PRNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// PRNG selection.
    pub fn rng_kind(&self) -> RngKind {
        self.rng_kind
    }

    /// Auxiliary trajectory window, when set.
    pub fn extra_traj(&self) -> Option<ExtraTrajWindow> {
        self.extra_traj
    }

    /// Whether redistribution runs.
    pub fn do_redistribution(&self) -> bool {
        self.do_redistribution
    }

    /// Redistribution cadence in steps.
    pub fn redistribution_interval(&self) -> u64 {
        self.redistribution_interval
    }

    /// Species shuffled by the split-box distributor.
    pub fn fast_species(&self) -> &[String] {
        &self.fast_species
    }

    /// Sub-box grid of the split-box distributor.
    pub fn nsplits(&self) -> (usize, usize, usize) {
        self.nsplits
    }

    /// Selected redistribution variant.
    pub fn distributor(&self) -> DistributorKind {
        self.distributor
    }

    /// Vacancy species of the per-process distributor.
    pub fn empty_element(&self) -> Option<&str> {
        self.empty_element.as_deref()
    }

    /// Frame cadence for redistribution passes.
    pub fn redist_dump_interval(&self) -> u64 {
        self.redist_dump_interval
    }

    /// Extra pinned sites for split-box redistribution.
    pub fn slow_indices(&self) -> Option<SlowIndicesFn> {
        self.slow_indices
    }
}

/// Builder for [`ControlParameters`]; `build()` validates everything.
#[derive(Debug, Clone)]
pub struct ControlParametersBuilder {
    params: ControlParameters,
}

impl Default for ControlParametersBuilder {
    fn default() -> Self {
        Self {
            params: ControlParameters {
                number_of_steps: 0,
                time_limit: f64::INFINITY,
                dump_interval: 1,
                analysis_interval: AnalysisInterval::default(),
                start_time: 0.0,
                seed: 1,
                rng_kind: RngKind::default(),
                extra_traj: None,
                do_redistribution: false,
                redistribution_interval: 10,
                fast_species: Vec::new(),
                nsplits: (1, 1, 1),
                distributor: DistributorKind::default(),
                empty_element: None,
                redist_dump_interval: 1,
                slow_indices: None,
            },
        }
    }
}

impl ControlParametersBuilder {
    /// Upper bound on kMC steps.
    pub fn number_of_steps(mut self, n: u64) -> Self {
        self.params.number_of_steps = n;
        self
    }

    /// Upper bound on simulation time.
    pub fn time_limit(mut self, t: f64) -> Self {
        self.params.time_limit = t;
        self
    }

    /// Trajectory dump cadence; must stay positive.
    pub fn dump_interval(mut self, n: u64) -> Self {
        self.params.dump_interval = n;
        self
    }

    /// One analysis cadence for every plugin.
    pub fn analysis_interval(mut self, n: u64) -> Self {
        self.params.analysis_interval = AnalysisInterval::Every(n);
        self
    }

    /// Per-plugin analysis cadences, positionally matched at run time.
    pub fn analysis_intervals(mut self, specs: Vec<IntervalSpec>) -> Self {
        self.params.analysis_interval = AnalysisInterval::PerPlugin(specs);
        self
    }

    /// Initial clock value.
    pub fn start_time(mut self, t: f64) -> Self {
        self.params.start_time = t;
        self
    }

    /// PRNG seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    /// PRNG selection.
    pub fn rng_kind(mut self, kind: RngKind) -> Self {
        self.params.rng_kind = kind;
        self
    }

    /// Auxiliary trajectory window.
    pub fn extra_traj(mut self, start: u64, end: u64, interval: u64) -> Self {
        self.params.extra_traj = Some(ExtraTrajWindow {
            start,
            end,
            interval,
        });
        self
    }

    /// Enables redistribution.
    pub fn do_redistribution(mut self, on: bool) -> Self {
        self.params.do_redistribution = on;
        self
    }

    /// Redistribution cadence in steps; must stay positive.
    pub fn redistribution_interval(mut self, n: u64) -> Self {
        self.params.redistribution_interval = n;
        self
    }

    /// Species shuffled by the split-box distributor.
    pub fn fast_species<S: AsRef<str>>(mut self, species: &[S]) -> Self {
        self.params.fast_species = species.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Sub-box grid of the split-box distributor.
    pub fn nsplits(mut self, splits: (usize, usize, usize)) -> Self {
        self.params.nsplits = splits;
        self
    }

    /// Selects the redistribution variant.
    pub fn distributor(mut self, kind: DistributorKind) -> Self {
        self.params.distributor = kind;
        self
    }

    /// Vacancy species for the per-process distributor.
    pub fn empty_element<S: Into<String>>(mut self, species: S) -> Self {
        self.params.empty_element = Some(species.into());
        self
    }

    /// Frame cadence for redistribution passes.
    pub fn redist_dump_interval(mut self, n: u64) -> Self {
        self.params.redist_dump_interval = n;
        self
    }

    /// Extra pinned sites for split-box redistribution.
    pub fn slow_indices(mut self, f: SlowIndicesFn) -> Self {
        self.params.slow_indices = Some(f);
        self
    }

    /// Validates and freezes the parameters.
    pub fn build(self) -> Result<ControlParameters, Error> {
        let p = self.params;
        if p.dump_interval == 0 {
            return Err(Error::validation("dump_interval must be positive"));
        }
        if !(p.start_time.is_finite() && p.start_time >= 0.0) {
            return Err(Error::validation(format!(
                "start_time must be non-negative and finite, got {}",
                p.start_time
            )));
        }
        if !(p.time_limit > 0.0) {
            return Err(Error::validation(format!(
                "time_limit must be positive, got {}",
                p.time_limit
            )));
        }
        match &p.analysis_interval {
            AnalysisInterval::Every(n) => IntervalSpec::Every(*n).validate()?,
            AnalysisInterval::PerPlugin(specs) => {
                for spec in specs {
                    spec.validate()?;
                }
            }
        }
        if let Some(w) = p.extra_traj {
            if w.interval == 0 || w.start >= w.end || w.interval > w.end - w.start {
                return Err(Error::validation(format!(
                    "bad extra trajectory parameter ({}, {}, {})",
                    w.start, w.end, w.interval
                )));
            }
        }
        if p.do_redistribution {
            if p.redistribution_interval == 0 {
                return Err(Error::validation(
                    "redistribution_interval must be a positive integer",
                ));
            }
            if p.redist_dump_interval == 0 {
                return Err(Error::validation(
                    "redist_dump_interval must be a positive integer",
                ));
            }
            let (sa, sb, sc) = p.nsplits;
            if sa == 0 || sb == 0 || sc == 0 {
                return Err(Error::validation(format!(
                    "nsplits components must be positive, got ({sa}, {sb}, {sc})"
                )));
            }
            if p.distributor == DistributorKind::ProcessRandom && p.empty_element.is_none() {
                return Err(Error::validation(
                    "empty_element is required for the per-process distributor",
                ));
            }
        }
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let p = ControlParameters::builder().build().unwrap();
        assert_eq!(p.number_of_steps(), 0);
        assert!(p.time_limit().is_infinite());
        assert_eq!(p.dump_interval(), 1);
        assert_eq!(p.seed(), 1);
        assert_eq!(p.rng_kind(), RngKind::Mt);
        assert!(!p.do_redistribution());
        assert_eq!(p.redistribution_interval(), 10);
        assert_eq!(p.nsplits(), (1, 1, 1));
        assert_eq!(p.distributor(), DistributorKind::SplitRandom);
    }

    #[test]
    fn zero_dump_interval_is_rejected() {
        assert!(ControlParameters::builder()
            .dump_interval(0)
            .build()
            .is_err());
    }

    #[test]
    fn extra_traj_window_is_validated() {
        assert!(ControlParameters::builder()
            .extra_traj(10, 5, 1)
            .build()
            .is_err());
        assert!(ControlParameters::builder()
            .extra_traj(0, 10, 20)
            .build()
            .is_err());
        assert!(ControlParameters::builder()
            .extra_traj(5, 50, 5)
            .build()
            .is_ok());
    }

    #[test]
    fn process_random_requires_empty_element() {
        let err = ControlParameters::builder()
            .do_redistribution(true)
            .distributor(DistributorKind::ProcessRandom)
            .build();
        assert!(err.is_err());
        let ok = ControlParameters::builder()
            .do_redistribution(true)
            .distributor(DistributorKind::ProcessRandom)
            .empty_element("V")
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn distributor_names_round_trip() {
        for kind in [DistributorKind::SplitRandom, DistributorKind::ProcessRandom] {
            assert_eq!(
                kind.to_string().parse::<DistributorKind>().unwrap(),
                kind
            );
        }
        assert!("ShuffleEverything".parse::<DistributorKind>().is_err());
    }

    #[test]
    fn window_interval_triggers() {
        let spec = IntervalSpec::Window {
            start: 10,
            end: 20,
            interval: 5,
        };
        assert!(!spec.triggers(5));
        assert!(spec.triggers(10));
        assert!(spec.triggers(15));
        assert!(spec.triggers(20));
        assert!(!spec.triggers(25));
    }
}
