//! # Controller telemetry

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Diagnostic record emitted by the lateral PID controller every cycle.
///
/// The serialised field names are consumed by downstream telemetry tools and
/// must not change. The controller terms are only present while the
/// controller is active.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatPidState {
    /// Measured steering angle (degrees)
    pub steer_angle: f64,

    /// Measured steering rate (degrees/second)
    pub steer_rate: f64,

    /// True if the controller was active this cycle
    pub active: bool,

    /// Proportional term
    pub p: Option<f64>,

    /// Integral term
    pub i: Option<f64>,

    /// Feedforward term
    pub f: Option<f64>,

    /// Final (clamped) output
    pub output: Option<f64>,

    /// True if the output was saturated while saturation checking applied
    pub saturated: Option<bool>
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl LatPidState {
    /// Serialise the record into a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a record from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}
