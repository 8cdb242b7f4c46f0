//! # Equipment Interface
//!
//! This module defines the structures decoded from the vehicle's equipment each cycle.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod car;
