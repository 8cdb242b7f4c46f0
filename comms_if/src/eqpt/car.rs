//! # Vehicle state
//!
//! The subset of the decoded vehicle bus data used by lateral control.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot of the vehicle's state, produced once per cycle by the bus decoder.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct VehicleState {
    /// Vehicle speed.
    ///
    /// Units: meters/second, expected to be non-negative.
    pub v_ego_ms: f64,

    /// Measured steering wheel angle.
    ///
    /// Units: degrees
    pub steer_angle_deg: f64,

    /// Measured steering wheel rate.
    ///
    /// Units: degrees/second
    pub steer_rate_degs: f64,

    /// True if the driver is applying torque to the steering wheel.
    pub steer_pressed: bool,

    /// True if the steering actuator is currently rate limiting the demand.
    pub steer_rate_limited: bool
}
