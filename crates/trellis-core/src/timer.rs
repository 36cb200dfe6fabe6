// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Continuous simulation time.

use rand::Rng;
use rand_distr::OpenClosed01;

use crate::prng::SimRng;

/// The simulation clock: current time and the last increment.
///
/// Time advances by an exponential waiting-time draw per kMC step,
/// `δt = −ln(u) / Σrate` with `u ∈ (0, 1]`, and is monotone non-decreasing.
/// `libm::log` keeps the draw bit-stable across platforms.
#[derive(Debug, Clone, Copy)]
pub struct SimulationTimer {
    time: f64,
    delta: f64,
}

impl SimulationTimer {
    /// Starts the clock at `start_time`.
    pub fn new(start_time: f64) -> Self {
        Self {
            time: start_time,
            delta: 0.0,
        }
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The δt of the most recent advance.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Advances by an exponential draw against the current total rate.
    ///
    /// The caller guarantees `total_rate > 0`; the driver fails with
    /// `NoAvailableProcess` before ever calling this with zero.
    pub fn advance(&mut self, total_rate: f64, rng: &mut SimRng) {
        debug_assert!(total_rate > 0.0);
        let u: f64 = rng.sample(OpenClosed01);
        self.delta = -libm::log(u) / total_rate;
        self.time += self.delta;
    }

    /// Records a zero-width event (redistribution passes do not consume
    /// simulation time).
    pub fn advance_zero(&mut self) {
        self.delta = 0.0;
    }
}
