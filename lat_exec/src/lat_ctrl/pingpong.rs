//! # Anti-pingpong filter
//!
//! A heuristic which damps large cycle-to-cycle jumps in the desired steering
//! angle, which would otherwise cause jerky actuation. It is not derived from
//! any model of the vehicle, the threshold and damping table are calibration
//! values.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::interp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Jumps in the desired angle larger than this are damped.
///
/// Units: degrees
pub const PINGPONG_THRESHOLD_DEG: f64 = 3.0;

/// Speed breakpoints of the damping table.
///
/// Units: meters/second
pub const PINGPONG_SPEED_BP_MS: [f64; 3] = [10.0, 25.0, 27.0];

/// Damping factor applied to the desired angle at each breakpoint.
pub const PINGPONG_DAMPING_V: [f64; 3] = [0.3, 0.8, 1.0];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Filter state, holding the last desired angle that was accepted.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct PingpongFilter {
    last_des_deg: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PingpongFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter a new raw desired angle.
    ///
    /// If the raw angle differs from the last accepted angle by more than
    /// `PINGPONG_THRESHOLD_DEG` it is scaled by the speed dependent damping
    /// factor. The returned angle becomes the last accepted angle.
    pub fn filter(&mut self, raw_des_deg: f64, v_ego_ms: f64) -> f64 {
        let des_deg = if (raw_des_deg - self.last_des_deg).abs() > PINGPONG_THRESHOLD_DEG {
            raw_des_deg * damping(v_ego_ms)
        }
        else {
            raw_des_deg
        };

        self.last_des_deg = des_deg;

        des_deg
    }

    /// The last accepted desired angle (degrees).
    pub fn last_des_deg(&self) -> f64 {
        self.last_des_deg
    }
}

/// Damping factor at the given speed.
pub fn damping(v_ego_ms: f64) -> f64 {
    interp(v_ego_ms, &PINGPONG_SPEED_BP_MS, &PINGPONG_DAMPING_V)
}
