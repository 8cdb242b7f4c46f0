//! # Steering limit policy
//!
//! The policy gives the largest steering command magnitude allowed at the
//! current speed. The controller's output never exceeds it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::VehicleParams;
use util::maths::interp;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A speed dependent symmetric limit on the steering command.
pub trait SteerLimit {
    /// Get the (positive) command limit at the given speed.
    fn limit(&self, vehicle: &VehicleParams, v_ego_ms: f64) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limit interpolated from the vehicle's `steer_max_bp`/`steer_max_v` table.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterpSteerLimit;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerLimit for InterpSteerLimit {
    fn limit(&self, vehicle: &VehicleParams, v_ego_ms: f64) -> f64 {
        interp(v_ego_ms, &vehicle.steer_max_bp, &vehicle.steer_max_v)
    }
}

impl<F> SteerLimit for F
where
    F: Fn(&VehicleParams, f64) -> f64
{
    fn limit(&self, vehicle: &VehicleParams, v_ego_ms: f64) -> f64 {
        self(vehicle, v_ego_ms)
    }
}
