//! # Gain scheduling
//!
//! Controller gains are scheduled against vehicle speed using piecewise
//! linear tables of breakpoints and values.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::ConfigError;
use util::maths::interp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A speed scheduled value.
///
/// Between breakpoints the value is linearly interpolated, outside of them it
/// is clamped to the first or last value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainSchedule {
    /// Speed breakpoints, must be non-decreasing.
    ///
    /// Units: meters/second
    pub bp: Vec<f64>,

    /// Value at each breakpoint.
    pub v: Vec<f64>
}

/// The full set of lateral gain curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainCurves {
    /// Proportional gain schedule
    pub kp: GainSchedule,

    /// Integral gain schedule
    pub ki: GainSchedule,

    /// Derivative gain schedule
    #[serde(default)]
    pub kd: GainSchedule,

    /// Feedforward gain
    pub kf: f64
}

/// Gains evaluated at a particular speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Gains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
    pub k_f: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for GainSchedule {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl GainSchedule {
    /// Create a new schedule, checking that the tables are consistent.
    pub fn new(bp: Vec<f64>, v: Vec<f64>) -> Result<Self, ConfigError> {
        let schedule = Self { bp, v };
        schedule.validate("gain")?;
        Ok(schedule)
    }

    /// A schedule which has the same value at all speeds.
    pub fn constant(value: f64) -> Self {
        Self {
            bp: vec![0.0],
            v: vec![value]
        }
    }

    /// Check the tables are non-empty, of matching length, finite, and that
    /// the breakpoints never decrease.
    ///
    /// `name` identifies the curve in the returned error.
    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.bp.is_empty() {
            return Err(ConfigError::EmptyCurve(name));
        }

        if self.bp.len() != self.v.len() {
            return Err(ConfigError::MismatchedCurve {
                name,
                num_bp: self.bp.len(),
                num_v: self.v.len()
            });
        }

        if self.bp.iter().chain(self.v.iter()).any(|x| !x.is_finite()) {
            return Err(ConfigError::NonFinite(name));
        }

        match self.bp.windows(2).position(|w| w[1] < w[0]) {
            Some(i) => Err(ConfigError::NonMonotonicBreakpoints { name, index: i + 1 }),
            None => Ok(())
        }
    }

    /// Get the scheduled value at the given speed.
    pub fn eval(&self, speed_ms: f64) -> f64 {
        interp(speed_ms, &self.bp, &self.v)
    }
}

impl GainCurves {
    /// Check all curves are valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kp.validate("kp")?;
        self.ki.validate("ki")?;
        self.kd.validate("kd")?;

        if !self.kf.is_finite() {
            return Err(ConfigError::NonFinite("kf"));
        }

        Ok(())
    }

    /// Evaluate the gains at the given speed.
    pub fn at(&self, speed_ms: f64) -> Gains {
        Gains {
            k_p: self.kp.eval(speed_ms),
            k_i: self.ki.eval(speed_ms),
            k_d: self.kd.eval(speed_ms),
            k_f: self.kf
        }
    }
}
