//! Time solver configuration.
//!
//! Exactly one of `time` and `steps` fixes the length of the run; the
//! other is derived once the step size is known. The step size is the
//! stable step scaled by `safety_factor` unless given explicitly.

use peridyn_types::constants::DEFAULT_SAFETY_FACTOR;
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

/// Configuration of the explicit Velocity-Verlet time solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSolverConfig {
    /// Simulated time span (seconds).
    #[serde(default)]
    pub time: Option<f64>,
    /// Number of time steps.
    #[serde(default)]
    pub steps: Option<usize>,
    /// Fixed step size (seconds). Bypasses the stability estimate.
    #[serde(default)]
    pub stepsize: Option<f64>,
    /// Factor in (0, 1] applied to the stable step size.
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,
    /// Recompute the stable step every this many steps.
    #[serde(default)]
    pub timestep_update_interval: Option<usize>,
}

fn default_safety_factor() -> f64 {
    DEFAULT_SAFETY_FACTOR
}

impl TimeSolverConfig {
    /// Runs for `time` seconds.
    pub fn with_time(time: f64) -> Self {
        Self {
            time: Some(time),
            ..Self::empty()
        }
    }

    /// Runs for `steps` time steps.
    pub fn with_steps(steps: usize) -> Self {
        Self {
            steps: Some(steps),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            time: None,
            steps: None,
            stepsize: None,
            safety_factor: DEFAULT_SAFETY_FACTOR,
            timestep_update_interval: None,
        }
    }

    /// Uses a fixed step size.
    pub fn stepsize(mut self, stepsize: f64) -> Self {
        self.stepsize = Some(stepsize);
        self
    }

    /// Sets the safety factor.
    pub fn safety_factor(mut self, safety_factor: f64) -> Self {
        self.safety_factor = safety_factor;
        self
    }

    /// Recomputes the stable step every `interval` steps.
    pub fn timestep_update_interval(mut self, interval: usize) -> Self {
        self.timestep_update_interval = Some(interval);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> PeridynResult<()> {
        match (self.time, self.steps) {
            (Some(_), Some(_)) => {
                return Err(PeridynError::InvalidConfig(
                    "Specify either `time` or `steps`, not both".into(),
                ))
            }
            (None, None) => {
                return Err(PeridynError::InvalidConfig(
                    "Either `time` or `steps` is required".into(),
                ))
            }
            (Some(t), None) if !(t.is_finite() && t > 0.0) => {
                return Err(PeridynError::InvalidConfig(format!(
                    "`time` must be positive, got {t}"
                )))
            }
            (None, Some(0)) => {
                return Err(PeridynError::InvalidConfig("`steps` must be >= 1".into()))
            }
            _ => {}
        }
        if let Some(dt) = self.stepsize {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(PeridynError::InvalidConfig(format!(
                    "`stepsize` must be positive, got {dt}"
                )));
            }
        }
        if !(self.safety_factor > 0.0 && self.safety_factor <= 1.0) {
            return Err(PeridynError::InvalidConfig(format!(
                "`safety_factor` must be in (0, 1], got {}",
                self.safety_factor
            )));
        }
        if self.timestep_update_interval == Some(0) {
            return Err(PeridynError::InvalidConfig(
                "`timestep_update_interval` must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Resolves the run length for step size `dt`: `(steps, time)`.
    pub fn resolve(&self, dt: f64) -> PeridynResult<(usize, f64)> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PeridynError::NumericFailure(format!(
                "Step size must be positive and finite, got {dt}"
            )));
        }
        match (self.steps, self.time) {
            (Some(steps), _) => Ok((steps, steps as f64 * dt)),
            (None, Some(time)) => {
                let steps = whole_steps(time / dt);
                if steps == 0 {
                    return Err(PeridynError::InvalidConfig(format!(
                        "`time` {time} is shorter than one step of {dt}"
                    )));
                }
                Ok((steps, time))
            }
            (None, None) => Err(PeridynError::InvalidConfig(
                "Either `time` or `steps` is required".into(),
            )),
        }
    }
}

/// Floors `ratio`, snapping values within rounding noise of an integer.
fn whole_steps(ratio: f64) -> usize {
    let nearest = ratio.round();
    if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest as usize
    } else {
        ratio.floor() as usize
    }
}
