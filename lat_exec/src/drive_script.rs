//! # Drive scripts
//!
//! A drive script is a recorded (or synthesised) sequence of control cycles,
//! stored as a CSV file with one row per cycle. Replaying a script through
//! `LatCtrl` lets the controller be exercised without a vehicle.
//!
//! The header row names the columns:
//!
//! ```text
//! v_ego_ms,steer_angle_deg,steer_rate_degs,steer_pressed,steer_rate_limited,angle_steers_deg,angle_offset_deg,engaged
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use comms_if::{eqpt::car::VehicleState, plan::DesiredPath};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The inputs to a single control cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveCycle {
    pub v_ego_ms: f64,
    pub steer_angle_deg: f64,
    pub steer_rate_degs: f64,
    pub steer_pressed: bool,
    pub steer_rate_limited: bool,
    pub angle_steers_deg: f64,

    #[serde(default)]
    pub angle_offset_deg: f64,

    /// True if lateral control is engaged on this cycle
    pub engaged: bool
}

/// A loaded drive script.
pub struct DriveScript {
    _script_path: Option<PathBuf>,
    cycles: Vec<DriveCycle>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DriveScriptError {
    #[error("Could not find the drive script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the drive script: {0}")]
    ScriptLoadError(csv::Error),

    #[error("The drive script contains no cycles")]
    ScriptEmpty
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCycle {
    pub fn vehicle_state(&self) -> VehicleState {
        VehicleState {
            v_ego_ms: self.v_ego_ms,
            steer_angle_deg: self.steer_angle_deg,
            steer_rate_degs: self.steer_rate_degs,
            steer_pressed: self.steer_pressed,
            steer_rate_limited: self.steer_rate_limited
        }
    }

    pub fn desired_path(&self) -> DesiredPath {
        DesiredPath {
            angle_steers_deg: self.angle_steers_deg,
            angle_offset_deg: self.angle_offset_deg
        }
    }
}

impl DriveScript {

    /// Load a drive script from the given path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, DriveScriptError> {
        let path = script_path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(DriveScriptError::ScriptNotFound(path));
        }

        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(DriveScriptError::ScriptLoadError)?;

        let mut script = Self::from_csv(reader)?;
        script._script_path = Some(path);

        Ok(script)
    }

    /// Load a drive script from any reader, for instance an in memory string.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, DriveScriptError> {
        Self::from_csv(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(rdr)
        )
    }

    /// Number of cycles in the script
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    /// Always false, since empty scripts cannot be loaded.
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Duration of the script when replayed at the given cycle period.
    ///
    /// Units: seconds
    pub fn duration_s(&self, cycle_period_s: f64) -> f64 {
        self.cycles.len() as f64 * cycle_period_s
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DriveCycle> {
        self.cycles.iter()
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DriveScriptError> {
        let cycles = reader
            .deserialize()
            .collect::<Result<Vec<DriveCycle>, csv::Error>>()
            .map_err(DriveScriptError::ScriptLoadError)?;

        if cycles.is_empty() {
            return Err(DriveScriptError::ScriptEmpty);
        }

        Ok(Self {
            _script_path: None,
            cycles
        })
    }
}
