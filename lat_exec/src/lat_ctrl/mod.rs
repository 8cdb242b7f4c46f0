//! Lateral control module
//!
//! Converts the desired steering angle from the path planner and the measured
//! steering state into a bounded steering command, once per control cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod feedforward;
mod gain_schedule;
mod params;
mod pid;
mod pingpong;
mod state;
mod steer_limit;
mod tuning;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use feedforward::*;
pub use gain_schedule::*;
pub use params::*;
pub use pid::*;
pub use pingpong::*;
pub use state::*;
pub use steer_limit::*;
pub use tuning::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this speed the controller is disabled and outputs zero.
///
/// Units: meters/second
pub const MIN_ACTIVE_SPEED_MS: f64 = 0.3;

/// Saturation is only tracked above this speed.
///
/// Units: meters/second
pub const SAT_CHECK_MIN_SPEED_MS: f64 = 10.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Inconsistent controller configuration, detected when parameters are built
/// or reloaded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Curve `{0}` has no breakpoints")]
    EmptyCurve(&'static str),

    #[error("Curve `{name}` has {num_bp} breakpoints but {num_v} values")]
    MismatchedCurve {
        name: &'static str,
        num_bp: usize,
        num_v: usize
    },

    #[error("Breakpoints of curve `{name}` decrease at index {index}")]
    NonMonotonicBreakpoints {
        name: &'static str,
        index: usize
    },

    #[error("`{0}` contains a non-finite value")]
    NonFinite(&'static str),

    #[error("Deadzone must not be negative, found {0}")]
    NegativeDeadzone(f64),

    #[error("Cycle period must be positive, found {0}")]
    InvalidCyclePeriod(f64)
}

/// Possible errors that can occur while setting up LatCtrl.
#[derive(Debug, thiserror::Error)]
pub enum LatCtrlError {
    #[error("Invalid controller configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Could not initialise the archives: {0}")]
    ArchiveInitError(#[from] util::archive::ArchiveError)
}
