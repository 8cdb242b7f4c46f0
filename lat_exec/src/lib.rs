//! # Lateral control library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the lateral control crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive scripts - recorded sequences of cycle inputs which can be replayed through the controller
pub mod drive_script;

/// Lateral control module - converts the desired steering angle into a bounded steering command
pub mod lat_ctrl;
