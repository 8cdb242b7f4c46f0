//! # Communications interface crate.
//!
//! Provides the interfaces between the lateral controller and the rest of
//! the driving stack.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data decoded from vehicle equipment (like the steering column)
pub mod eqpt;

/// Outputs of the path planner consumed by the controllers
pub mod plan;

/// Telemetry records produced by the controllers
pub mod tm;
