//! # Steering feedforward

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::SteerControlType;
use util::maths::poly_val;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Speed polynomial scaling the torque feedforward, highest power first.
///
/// Approximates the realigning moment of the tyres, which grows with lateral
/// acceleration.
pub const TORQUE_FF_COEFFS: [f64; 3] = [0.35189607550172824, 7.506201251644202, 69.226826411091];

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the feedforward for the desired steering angle.
///
/// For angle actuation the feedforward is the desired angle itself. For
/// torque actuation the planner's angle offset is removed first, since it
/// does not contribute to the resistive torque, and the result is scaled by
/// `TORQUE_FF_COEFFS` evaluated at the current speed.
///
/// The feedforward gain is applied later by the PID.
pub fn calc_feedforward(
    angle_des_deg: f64,
    angle_offset_deg: f64,
    v_ego_ms: f64,
    steer_control_type: SteerControlType
) -> f64 {
    match steer_control_type {
        SteerControlType::Angle => angle_des_deg,
        SteerControlType::Torque => {
            (angle_des_deg - angle_offset_deg) * poly_val(&v_ego_ms, &TORQUE_FF_COEFFS)
        }
    }
}
