//! Parameters structures for LatCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{ConfigError, GainCurves, GainSchedule, TuningOverrides};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters describing the vehicle's steering system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleParams {
    /// How the steering actuator is commanded.
    pub steer_control_type: SteerControlType,

    /// Speed breakpoints of the maximum steering command table.
    ///
    /// Units: meters/second
    pub steer_max_bp: Vec<f64>,

    /// Maximum steering command magnitude at each breakpoint.
    pub steer_max_v: Vec<f64>,

    /// Default lateral gains, used until the tuning provider overrides them.
    pub lateral_tuning: GainCurves
}

/// Parameters for lateral control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Period of one control cycle, used as the integration time step.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Initial proportional error deadzone.
    ///
    /// Units: degrees
    pub deadzone_deg: f64,

    /// Path of the live tuning file, relative to the params directory. If
    /// not set live tuning is disabled.
    #[serde(default)]
    pub tuning_file: Option<String>
}

/// The live parameters of the controller, which may be replaced by the
/// tuning provider between cycles.
///
/// A `ControllerParams` can only be built from a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerParams {
    deadzone_deg: f64,
    gains: GainCurves
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The type of steering actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteerControlType {
    /// The actuator takes a steering angle demand.
    Angle,

    /// The actuator takes a steering torque demand.
    Torque
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleParams {
    /// Check the steering limit table and default gains are valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        GainSchedule {
            bp: self.steer_max_bp.clone(),
            v: self.steer_max_v.clone()
        }.validate("steer_max")?;

        self.lateral_tuning.validate()
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.01,
            deadzone_deg: 0.0,
            tuning_file: None
        }
    }
}

impl Params {
    /// Check the parameters are valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cycle_period_s > 0.0 && self.cycle_period_s.is_finite()) {
            return Err(ConfigError::InvalidCyclePeriod(self.cycle_period_s));
        }

        if !self.deadzone_deg.is_finite() {
            return Err(ConfigError::NonFinite("deadzone_deg"));
        }
        if self.deadzone_deg < 0.0 {
            return Err(ConfigError::NegativeDeadzone(self.deadzone_deg));
        }

        Ok(())
    }
}

impl ControllerParams {
    /// Build a new set of live parameters.
    pub fn new(deadzone_deg: f64, gains: GainCurves) -> Result<Self, ConfigError> {
        if !deadzone_deg.is_finite() {
            return Err(ConfigError::NonFinite("deadzone"));
        }
        if deadzone_deg < 0.0 {
            return Err(ConfigError::NegativeDeadzone(deadzone_deg));
        }

        gains.validate()?;

        Ok(Self { deadzone_deg, gains })
    }

    /// Build the parameters that result from applying the given overrides.
    ///
    /// The deadzone is always replaced. Gains are only replaced if the
    /// overrides enable gain tuning and provide a set of gains.
    pub fn with_overrides(&self, overrides: &TuningOverrides) -> Result<Self, ConfigError> {
        let gains = match (overrides.gains_enabled, &overrides.gains) {
            (true, Some(g)) => g.clone(),
            _ => self.gains.clone()
        };

        Self::new(overrides.deadzone, gains)
    }

    pub fn deadzone_deg(&self) -> f64 {
        self.deadzone_deg
    }

    pub fn gains(&self) -> &GainCurves {
        &self.gains
    }
}
