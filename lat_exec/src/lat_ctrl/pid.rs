//! # Lateral PID controller
//!
//! The PID core of lateral control. Compared to a textbook PID it:
//!
//! - applies a deadzone to the error before the proportional and integral
//!   terms,
//! - takes the derivative of the measurement rather than of the error, so
//!   that steps in the desired angle don't kick the output,
//! - adds a feedforward term outside of the error driven terms,
//! - limits the integrator so that proportional, integral and feedforward
//!   together never exceed the output limit, and freezes it while the output
//!   was saturated on the previous cycle or the driver is overriding.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::Gains;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The lateral PID controller and its integrator state.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct LatPid {
    /// Proportional term of the last update
    p: f64,

    /// The integral accumulation, which persists between updates
    i: f64,

    /// Derivative term of the last update
    d: f64,

    /// Feedforward term of the last update
    f: f64,

    /// Output of the last update
    control: f64,

    /// True if the last update saturated while saturation was being checked.
    /// Freezes the integrator on the next update.
    saturated: bool
}

/// Inputs to a single update of the controller.
#[derive(Debug, Default, Clone, Copy)]
pub struct PidDemand {
    /// The desired value
    pub setpoint: f64,

    /// The measured value
    pub measurement: f64,

    /// Rate of change of the measured value, per second
    pub measurement_rate: f64,

    /// Feedforward, before the feedforward gain is applied
    pub feedforward: f64,

    /// If true a clamped output raises the saturated flag
    pub check_saturation: bool,

    /// If true the integrator is held at its current value
    pub freeze_integrator: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LatPid {

    /// Create a new controller with zeroed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero all controller state, including the integrator.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Update the controller, returning the output.
    ///
    /// The output is always within `[-limit, limit]`. A negative or NaN
    /// `limit` is treated as zero. `dt_s` is the time step of the integrator.
    pub fn update(
        &mut self,
        demand: &PidDemand,
        gains: &Gains,
        deadzone: f64,
        limit: f64,
        dt_s: f64
    ) -> f64 {
        let limit = limit.max(0.0);

        let error = apply_deadzone(demand.setpoint - demand.measurement, deadzone);

        self.p = gains.k_p * error;
        self.f = gains.k_f * demand.feedforward;
        self.d = -gains.k_d * demand.measurement_rate;

        // The saturated flag is from the previous update
        if !self.saturated && !demand.freeze_integrator {
            let pf = self.p + self.f;
            let i = self.i + gains.k_i * error * dt_s;

            // Accumulation may not carry p + i + f past the limit, but it
            // never pulls the integrator back either. A non-finite input must
            // not poison the integrator.
            if i.is_finite() {
                self.i = if i > self.i {
                    i.min((limit - pf).max(self.i))
                }
                else {
                    i.max((-limit - pf).min(self.i))
                };
            }
        }

        let raw = self.p + self.i + self.d + self.f;

        self.control = if raw.is_nan() {
            0.0
        }
        else {
            clamp(&raw, &-limit, &limit)
        };

        self.saturated = demand.check_saturation && raw != self.control;

        self.control
    }

    /// Proportional term of the last update
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Current integral term
    pub fn i(&self) -> f64 {
        self.i
    }

    /// Derivative term of the last update
    pub fn d(&self) -> f64 {
        self.d
    }

    /// Feedforward term of the last update
    pub fn f(&self) -> f64 {
        self.f
    }

    /// Output of the last update
    pub fn control(&self) -> f64 {
        self.control
    }

    pub fn saturated(&self) -> bool {
        self.saturated
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Shrink the error towards zero by the width of the deadzone.
///
/// Errors inside the deadzone become zero, errors outside it keep their sign
/// but lose `deadzone` from their magnitude.
pub fn apply_deadzone(error: f64, deadzone: f64) -> f64 {
    if error > deadzone {
        error - deadzone
    }
    else if error < -deadzone {
        error + deadzone
    }
    else {
        0.0
    }
}
