//! # Live tuning
//!
//! The deadzone and, optionally, the gains of the controller can be changed
//! while running. Every `TUNING_RELOAD_PERIOD_CYCLES` cycles the reload timer
//! asks a `TuningProvider` for new values, and if they are valid swaps them
//! into the controller's parameters before the cycle is computed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Internal
use super::{ConfigError, ControllerParams, GainCurves};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of cycles between attempts to reload the tuning.
pub const TUNING_RELOAD_PERIOD_CYCLES: u32 = 300;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Values supplied by a tuning provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningOverrides {
    /// New proportional error deadzone.
    ///
    /// Units: degrees
    pub deadzone: f64,

    /// If true `gains` replace the controller's gains.
    #[serde(default)]
    pub gains_enabled: bool,

    #[serde(default)]
    pub gains: Option<GainCurves>
}

/// Counts cycles between tuning reloads.
#[derive(Debug, Clone)]
pub struct TuningReloadTimer {
    cycles: u32,
    period: u32
}

/// A provider which never has any new tuning.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTuning;

/// Reads tuning overrides from a JSON file.
///
/// The file is read again on every load, so it can be edited while the
/// controller runs. A missing file means there is no tuning to apply.
#[derive(Debug, Clone)]
pub struct FileTuningProvider {
    path: PathBuf
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors a tuning provider may report. These are treated as transient.
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("Cannot read the tuning file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot parse the tuning file: {0}")]
    DeserialiseError(serde_json::Error)
}

/// The result of a single tick of the reload timer.
#[derive(Debug, Clone, PartialEq)]
pub enum ReloadOutcome {
    /// The reload period has not elapsed yet.
    NotDue,

    /// The provider had nothing new.
    NoUpdate,

    /// New parameters were applied.
    Applied,

    /// The provider's values were invalid and the previous parameters kept.
    Rejected(ConfigError),

    /// The provider failed, the reload will be tried again next period.
    ProviderFailed
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of live tuning values.
///
/// `load` is called from within the control cycle so must return in bounded
/// time.
pub trait TuningProvider {
    /// Get the latest tuning, or `None` if there is nothing to apply.
    fn load(&mut self) -> Result<Option<TuningOverrides>, TuningError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TuningReloadTimer {
    fn default() -> Self {
        Self::new(TUNING_RELOAD_PERIOD_CYCLES)
    }
}

impl TuningReloadTimer {
    /// Create a timer which reloads every `period` cycles. A period of zero
    /// is treated as one.
    pub fn new(period: u32) -> Self {
        Self {
            cycles: 0,
            period: period.max(1)
        }
    }

    /// Count one cycle, reloading from the provider if the period has
    /// elapsed.
    ///
    /// Must be called once per cycle whether or not the controller is
    /// engaged. The counter restarts after every reload attempt, whatever its
    /// outcome.
    pub fn tick(
        &mut self,
        provider: &mut dyn TuningProvider,
        params: &mut ControllerParams
    ) -> ReloadOutcome {
        self.cycles += 1;

        if self.cycles < self.period {
            return ReloadOutcome::NotDue;
        }

        self.cycles = 0;

        reload(provider, params)
    }

    /// Cycles counted since the last reload attempt.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}

impl TuningProvider for NoTuning {
    fn load(&mut self) -> Result<Option<TuningOverrides>, TuningError> {
        Ok(None)
    }
}

impl FileTuningProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TuningProvider for FileTuningProvider {
    fn load(&mut self) -> Result<Option<TuningOverrides>, TuningError> {
        let tuning_str = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TuningError::FileLoadError(self.path.clone(), e))
        };

        serde_json::from_str(&tuning_str)
            .map(Some)
            .map_err(TuningError::DeserialiseError)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Query the provider and apply its overrides to `params`.
///
/// `params` is only replaced if the new values are valid.
pub fn reload(
    provider: &mut dyn TuningProvider,
    params: &mut ControllerParams
) -> ReloadOutcome {
    let overrides = match provider.load() {
        Ok(Some(o)) => o,
        Ok(None) => return ReloadOutcome::NoUpdate,
        Err(e) => {
            warn!("Tuning provider failed, will retry next period: {}", e);
            return ReloadOutcome::ProviderFailed
        }
    };

    match params.with_overrides(&overrides) {
        Ok(new_params) => {
            debug!(
                "Applying tuning: deadzone {} deg, gains updated: {}",
                new_params.deadzone_deg(),
                new_params.gains() != params.gains()
            );
            *params = new_params;
            ReloadOutcome::Applied
        },
        Err(e) => {
            warn!("Rejected invalid tuning, keeping the previous parameters: {}", e);
            ReloadOutcome::Rejected(e)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lat_ctrl::GainSchedule;
    use std::collections::VecDeque;

    /// Returns queued responses in order, then `None` forever.
    struct MockProvider {
        responses: VecDeque<Result<Option<TuningOverrides>, TuningError>>,
        num_loads: usize
    }

    impl MockProvider {
        fn new(
            responses: Vec<Result<Option<TuningOverrides>, TuningError>>
        ) -> Self {
            Self {
                responses: responses.into(),
                num_loads: 0
            }
        }
    }

    impl TuningProvider for MockProvider {
        fn load(&mut self) -> Result<Option<TuningOverrides>, TuningError> {
            self.num_loads += 1;
            self.responses.pop_front().unwrap_or(Ok(None))
        }
    }

    fn gains() -> GainCurves {
        GainCurves {
            kp: GainSchedule::constant(0.2),
            ki: GainSchedule::constant(0.05),
            kd: GainSchedule::default(),
            kf: 1.0
        }
    }

    fn overrides(deadzone: f64) -> TuningOverrides {
        TuningOverrides {
            deadzone,
            gains_enabled: false,
            gains: None
        }
    }

    fn provider_error() -> TuningError {
        TuningError::FileLoadError(
            PathBuf::from("tune.json"),
            std::io::Error::new(std::io::ErrorKind::Other, "busy")
        )
    }

    #[test]
    fn test_reload_period() {
        let mut timer = TuningReloadTimer::default();
        let mut provider = MockProvider::new(vec![Ok(Some(overrides(0.5)))]);
        let mut params = ControllerParams::new(0.0, gains()).unwrap();

        for _ in 0..(TUNING_RELOAD_PERIOD_CYCLES - 1) {
            assert_eq!(timer.tick(&mut provider, &mut params), ReloadOutcome::NotDue);
        }
        assert_eq!(provider.num_loads, 0);
        assert_eq!(params.deadzone_deg(), 0.0);

        assert_eq!(timer.tick(&mut provider, &mut params), ReloadOutcome::Applied);
        assert_eq!(provider.num_loads, 1);
        assert_eq!(timer.cycles(), 0);
        assert_eq!(params.deadzone_deg(), 0.5);

        // Nothing new at the next reload, but the counter still restarts
        for _ in 0..(TUNING_RELOAD_PERIOD_CYCLES - 1) {
            timer.tick(&mut provider, &mut params);
        }
        assert_eq!(timer.tick(&mut provider, &mut params), ReloadOutcome::NoUpdate);
        assert_eq!(provider.num_loads, 2);
        assert_eq!(timer.cycles(), 0);
        assert_eq!(params.deadzone_deg(), 0.5);
    }

    #[test]
    fn test_gains_only_when_enabled() {
        let new_gains = GainCurves { kf: 0.5, ..gains() };
        let mut provider = MockProvider::new(vec![
            Ok(Some(TuningOverrides {
                deadzone: 0.1,
                gains_enabled: false,
                gains: Some(new_gains.clone())
            })),
            Ok(Some(TuningOverrides {
                deadzone: 0.2,
                gains_enabled: true,
                gains: Some(new_gains.clone())
            })),
            // Enabled but no gains given keeps the current gains
            Ok(Some(TuningOverrides {
                deadzone: 0.3,
                gains_enabled: true,
                gains: None
            }))
        ]);
        let mut params = ControllerParams::new(0.0, gains()).unwrap();

        assert_eq!(reload(&mut provider, &mut params), ReloadOutcome::Applied);
        assert_eq!(params.deadzone_deg(), 0.1);
        assert_eq!(params.gains(), &gains());

        assert_eq!(reload(&mut provider, &mut params), ReloadOutcome::Applied);
        assert_eq!(params.deadzone_deg(), 0.2);
        assert_eq!(params.gains(), &new_gains);

        assert_eq!(reload(&mut provider, &mut params), ReloadOutcome::Applied);
        assert_eq!(params.deadzone_deg(), 0.3);
        assert_eq!(params.gains(), &new_gains);
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let bad_gains = GainCurves {
            kp: GainSchedule { bp: vec![10.0, 5.0], v: vec![0.1, 0.2] },
            ..gains()
        };
        let mut provider = MockProvider::new(vec![
            Ok(Some(overrides(-1.0))),
            Ok(Some(TuningOverrides {
                deadzone: 0.5,
                gains_enabled: true,
                gains: Some(bad_gains)
            }))
        ]);
        let mut params = ControllerParams::new(0.25, gains()).unwrap();
        let before = params.clone();

        assert_eq!(
            reload(&mut provider, &mut params),
            ReloadOutcome::Rejected(ConfigError::NegativeDeadzone(-1.0))
        );
        assert_eq!(params, before);

        // A bad gain table also rejects the deadzone that came with it
        assert_eq!(
            reload(&mut provider, &mut params),
            ReloadOutcome::Rejected(ConfigError::NonMonotonicBreakpoints { name: "kp", index: 1 })
        );
        assert_eq!(params, before);
    }

    #[test]
    fn test_provider_failure_retried() {
        let mut timer = TuningReloadTimer::new(2);
        let mut provider = MockProvider::new(vec![
            Err(provider_error()),
            Ok(Some(overrides(0.75)))
        ]);
        let mut params = ControllerParams::new(0.0, gains()).unwrap();

        assert_eq!(timer.tick(&mut provider, &mut params), ReloadOutcome::NotDue);
        assert_eq!(timer.tick(&mut provider, &mut params), ReloadOutcome::ProviderFailed);
        assert_eq!(params.deadzone_deg(), 0.0);

        assert_eq!(timer.tick(&mut provider, &mut params), ReloadOutcome::NotDue);
        assert_eq!(timer.tick(&mut provider, &mut params), ReloadOutcome::Applied);
        assert_eq!(params.deadzone_deg(), 0.75);
    }

    #[test]
    fn test_no_tuning() {
        let mut params = ControllerParams::new(0.0, gains()).unwrap();
        assert_eq!(reload(&mut NoTuning, &mut params), ReloadOutcome::NoUpdate);
    }

    #[test]
    fn test_file_provider() {
        let dir = std::env::temp_dir().join(format!("lat_tuning_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tune.json");
        let _ = std::fs::remove_file(&path);

        let mut provider = FileTuningProvider::new(&path);

        // Missing file is not an error
        assert!(matches!(provider.load(), Ok(None)));

        std::fs::write(&path, r#"{"deadzone": 0.5}"#).unwrap();
        assert_eq!(provider.load().unwrap(), Some(overrides(0.5)));

        std::fs::write(
            &path,
            r#"{
                "deadzone": 0.0,
                "gains_enabled": true,
                "gains": {
                    "kp": {"bp": [0.0, 20.0], "v": [0.1, 0.3]},
                    "ki": {"bp": [0.0], "v": [0.01]},
                    "kf": 0.00004
                }
            }"#
        ).unwrap();
        let o = provider.load().unwrap().unwrap();
        assert!(o.gains_enabled);
        let g = o.gains.unwrap();
        assert_eq!(g.kp.v, vec![0.1, 0.3]);
        assert_eq!(g.kd, GainSchedule::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(provider.load(), Err(TuningError::DeserialiseError(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
