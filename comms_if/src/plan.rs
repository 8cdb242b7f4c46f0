//! # Path planner outputs

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The desired steering produced by the path planner for this cycle.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct DesiredPath {
    /// Desired steering wheel angle.
    ///
    /// Units: degrees
    pub angle_steers_deg: f64,

    /// Steering angle offset estimated by the planner. Only used by torque
    /// controlled vehicles, where it is removed from the feedforward.
    ///
    /// Units: degrees
    pub angle_offset_deg: f64
}
