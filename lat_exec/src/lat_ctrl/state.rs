//! Implementations for the LatCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use serde::Serialize;

// Internal
use super::{
    calc_feedforward, reload,
    ControllerParams, InterpSteerLimit, LatCtrlError, LatPid, Params,
    PidDemand, PingpongFilter, ReloadOutcome, SteerLimit, TuningProvider,
    TuningReloadTimer, VehicleParams,
    MIN_ACTIVE_SPEED_MS, SAT_CHECK_MIN_SPEED_MS};
use comms_if::{eqpt::car::VehicleState, plan::DesiredPath, tm::LatPidState};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lateral control module state
pub struct LatCtrl {

    params: Params,

    /// Live parameters, only changed by the reload timer
    ctrl_params: ControllerParams,

    pid: LatPid,

    pingpong: PingpongFilter,

    reload_timer: TuningReloadTimer,

    tuning: Box<dyn TuningProvider>,

    steer_limit: Box<dyn SteerLimit>,

    report: LatPidState,
    arch_report: Archiver,

    output: OutputData,
    arch_output: Archiver
}

/// Output command from LatCtrl that the steering actuator must execute.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct OutputData {
    /// Steering demand, always within the steering limit for the current
    /// speed.
    ///
    /// Units: degrees for angle actuation, actuator torque units for torque
    ///        actuation.
    pub steer_cmd: f64,

    /// Desired steering angle after the anti-pingpong filter. Holds the last
    /// active value while the controller is disabled.
    ///
    /// Units: degrees
    pub angle_steers_des_deg: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LatCtrl {
    /// Create a new controller.
    ///
    /// The vehicle's default gains and the deadzone in `params` are used
    /// unless the tuning provider overrides them, which it is asked to do
    /// once immediately and then periodically.
    pub fn new(
        vehicle_params: &VehicleParams,
        params: Params,
        mut tuning: Box<dyn TuningProvider>
    ) -> Result<Self, LatCtrlError> {
        vehicle_params.validate()?;
        params.validate()?;

        let mut ctrl_params = ControllerParams::new(
            params.deadzone_deg,
            vehicle_params.lateral_tuning.clone()
        )?;

        match reload(tuning.as_mut(), &mut ctrl_params) {
            ReloadOutcome::Applied => info!(
                "Initial tuning loaded, deadzone {} deg", ctrl_params.deadzone_deg()
            ),
            outcome => debug!("Initial tuning not applied: {:?}", outcome)
        }

        Ok(Self {
            params,
            ctrl_params,
            pid: LatPid::new(),
            pingpong: PingpongFilter::new(),
            reload_timer: TuningReloadTimer::default(),
            tuning,
            steer_limit: Box::new(InterpSteerLimit),
            report: LatPidState::default(),
            arch_report: Archiver::default(),
            output: OutputData::default(),
            arch_output: Archiver::default()
        })
    }

    /// Replace the steering limit policy.
    pub fn with_steer_limit(mut self, steer_limit: Box<dyn SteerLimit>) -> Self {
        self.steer_limit = steer_limit;
        self
    }

    /// Start archiving into the given session.
    pub fn init_archives(&mut self, session: &Session) -> Result<(), LatCtrlError> {
        self.arch_report = Archiver::from_path(session, "lat_ctrl/lat_pid_state.csv")?;
        self.arch_output = Archiver::from_path(session, "lat_ctrl/output.csv")?;

        Ok(())
    }

    /// Reset the PID, zeroing the integrator.
    pub fn reset(&mut self) {
        self.pid.reset();
    }

    /// Perform one control cycle.
    ///
    /// Must be called exactly once per cycle period. The controller is
    /// disabled, giving a zero command, if it is not `engaged` or the vehicle
    /// is below `MIN_ACTIVE_SPEED_MS`.
    pub fn step(
        &mut self,
        vehicle_state: &VehicleState,
        desired_path: &DesiredPath,
        vehicle_params: &VehicleParams,
        engaged: bool
    ) -> (OutputData, LatPidState) {

        // New tuning takes effect from this cycle
        self.reload_timer.tick(self.tuning.as_mut(), &mut self.ctrl_params);

        let v_ego_ms = vehicle_state.v_ego_ms;

        let mut report = LatPidState {
            steer_angle: vehicle_state.steer_angle_deg,
            steer_rate: vehicle_state.steer_rate_degs,
            active: false,
            ..Default::default()
        };

        // Written so that a NaN speed disables the controller
        let output = if !engaged || !(v_ego_ms >= MIN_ACTIVE_SPEED_MS) {
            self.pid.reset();

            OutputData {
                steer_cmd: 0.0,
                angle_steers_des_deg: self.pingpong.last_des_deg()
            }
        }
        else {
            let gains = self.ctrl_params.gains().at(v_ego_ms);
            let limit = self.steer_limit.limit(vehicle_params, v_ego_ms);

            let angle_des_deg = self.pingpong.filter(desired_path.angle_steers_deg, v_ego_ms);

            let demand = PidDemand {
                setpoint: angle_des_deg,
                measurement: vehicle_state.steer_angle_deg,
                measurement_rate: vehicle_state.steer_rate_degs,
                feedforward: calc_feedforward(
                    angle_des_deg,
                    desired_path.angle_offset_deg,
                    v_ego_ms,
                    vehicle_params.steer_control_type
                ),
                check_saturation: v_ego_ms > SAT_CHECK_MIN_SPEED_MS
                    && !vehicle_state.steer_rate_limited
                    && !vehicle_state.steer_pressed,
                freeze_integrator: vehicle_state.steer_pressed
            };

            let steer_cmd = self.pid.update(
                &demand,
                &gains,
                self.ctrl_params.deadzone_deg(),
                limit,
                self.params.cycle_period_s
            );

            report.active = true;
            report.p = Some(self.pid.p());
            report.i = Some(self.pid.i());
            report.f = Some(self.pid.f());
            report.output = Some(steer_cmd);
            report.saturated = Some(self.pid.saturated());

            OutputData {
                steer_cmd,
                angle_steers_des_deg: angle_des_deg
            }
        };

        trace!(
            "LatCtrl output: {:?}, active: {}, saturated: {:?}",
            output, report.active, report.saturated
        );

        self.report = report;
        self.output = output;

        (output, report)
    }

    /// The live controller parameters.
    pub fn controller_params(&self) -> &ControllerParams {
        &self.ctrl_params
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The PID core, for inspecting the integrator.
    pub fn pid(&self) -> &LatPid {
        &self.pid
    }
}

impl Archived for LatCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)?;
        self.arch_output.serialise(self.output)?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lat_ctrl::{
        GainCurves, GainSchedule, NoTuning, SteerControlType, TuningError,
        TuningOverrides, TUNING_RELOAD_PERIOD_CYCLES};
    use approx::assert_relative_eq;
    use std::collections::VecDeque;

    struct MockProvider {
        responses: VecDeque<Option<TuningOverrides>>
    }

    impl TuningProvider for MockProvider {
        fn load(&mut self) -> Result<Option<TuningOverrides>, TuningError> {
            Ok(self.responses.pop_front().flatten())
        }
    }

    fn vehicle(kp: f64, ki: f64, kf: f64) -> VehicleParams {
        VehicleParams {
            steer_control_type: SteerControlType::Torque,
            steer_max_bp: vec![0.0, 20.0],
            steer_max_v: vec![1.0, 0.5],
            lateral_tuning: GainCurves {
                kp: GainSchedule::constant(kp),
                ki: GainSchedule::constant(ki),
                kd: GainSchedule::default(),
                kf
            }
        }
    }

    fn ctrl(vp: &VehicleParams) -> LatCtrl {
        LatCtrl::new(vp, Params::default(), Box::new(NoTuning)).unwrap()
    }

    fn state(v_ego_ms: f64, steer_angle_deg: f64) -> VehicleState {
        VehicleState {
            v_ego_ms,
            steer_angle_deg,
            ..Default::default()
        }
    }

    fn path(angle_steers_deg: f64) -> DesiredPath {
        DesiredPath {
            angle_steers_deg,
            angle_offset_deg: 0.0
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut vp = vehicle(0.1, 0.1, 0.0);
        vp.steer_max_bp = vec![20.0, 0.0];
        assert!(matches!(
            LatCtrl::new(&vp, Params::default(), Box::new(NoTuning)),
            Err(LatCtrlError::InvalidConfig(_))
        ));

        let vp = vehicle(0.1, 0.1, 0.0);
        let params = Params { deadzone_deg: -0.5, ..Params::default() };
        assert!(matches!(
            LatCtrl::new(&vp, params, Box::new(NoTuning)),
            Err(LatCtrlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_disabled_resets() {
        let vp = vehicle(0.1, 1.0, 0.0);
        let mut lc = ctrl(&vp);

        // Build up some integral
        for _ in 0..50 {
            lc.step(&state(5.0, 0.0), &path(2.0), &vp, true);
        }
        assert!(lc.pid().i() > 0.0);

        // Disengaged
        let (out, report) = lc.step(&state(5.0, 0.0), &path(2.0), &vp, false);
        assert_eq!(out.steer_cmd, 0.0);
        assert_eq!(lc.pid().i(), 0.0);
        assert!(!report.active);

        for _ in 0..50 {
            lc.step(&state(5.0, 0.0), &path(2.0), &vp, true);
        }
        assert!(lc.pid().i() > 0.0);

        // Too slow
        let (out, _) = lc.step(&state(0.2, 0.0), &path(2.0), &vp, true);
        assert_eq!(out.steer_cmd, 0.0);
        assert_eq!(lc.pid().i(), 0.0);

        // Unknown speed
        let (out, _) = lc.step(&state(f64::NAN, 0.0), &path(2.0), &vp, true);
        assert_eq!(out.steer_cmd, 0.0);
        assert_eq!(lc.pid().i(), 0.0);
    }

    #[test]
    fn test_explicit_reset() {
        let vp = vehicle(0.1, 1.0, 0.0);
        let mut lc = ctrl(&vp);

        for _ in 0..10 {
            lc.step(&state(5.0, 0.0), &path(2.0), &vp, true);
        }
        assert!(lc.pid().i() > 0.0);

        lc.reset();
        assert_eq!(lc.pid().i(), 0.0);
    }

    #[test]
    fn test_output_within_limit() {
        let vp = vehicle(1e3, 1e3, 1.0);
        let speeds = [0.3, 5.0, 10.0, 15.0, 20.0, 40.0];
        let angles = [-1e6, -30.0, -1.0, 0.0, 1.0, 30.0, 1e6];

        for v in speeds.iter() {
            let mut lc = ctrl(&vp);
            let limit = InterpSteerLimit.limit(&vp, *v);

            for des in angles.iter() {
                for meas in angles.iter() {
                    let s = VehicleState {
                        steer_rate_degs: *meas,
                        ..state(*v, *meas)
                    };
                    let (out, report) = lc.step(&s, &path(*des), &vp, true);

                    assert!(out.steer_cmd.abs() <= limit);
                    assert_eq!(report.output, Some(out.steer_cmd));
                }
            }
        }
    }

    #[test]
    fn test_converges_with_no_error() {
        let vp = vehicle(0.2, 0.05, 0.0);
        let mut lc = ctrl(&vp);

        let mut out = OutputData::default();
        for _ in 0..100 {
            out = lc.step(&state(15.0, 2.0), &path(2.0), &vp, true).0;
        }

        assert_relative_eq!(out.steer_cmd, 0.0);
        assert_eq!(lc.pid().i(), 0.0);
    }

    #[test]
    fn test_steady_after_error_removed() {
        let vp = vehicle(0.2, 0.05, 0.0);
        let mut lc = ctrl(&vp);
        let limit = InterpSteerLimit.limit(&vp, 15.0);

        // Start off the desired angle
        let mut out = OutputData::default();
        for _ in 0..50 {
            out = lc.step(&state(15.0, 1.0), &path(2.0), &vp, true).0;
        }
        assert!(out.steer_cmd > 0.0);
        assert!(out.steer_cmd <= limit);
        let i = lc.pid().i();
        assert!(i > 0.0);

        // Reach it, the proportional term drops out and the integrator stops
        // accumulating
        for _ in 0..50 {
            let (out, report) = lc.step(&state(15.0, 2.0), &path(2.0), &vp, true);
            assert_eq!(report.p, Some(0.0));
            assert_eq!(report.i, Some(i));
            assert_relative_eq!(out.steer_cmd, i);
            assert!(out.steer_cmd.abs() <= limit);
        }
    }

    #[test]
    fn test_pingpong_through_step() {
        let vp = vehicle(0.1, 0.0, 0.0);
        let mut lc = ctrl(&vp);

        let (out, _) = lc.step(&state(5.0, 0.0), &path(0.0), &vp, true);
        assert_eq!(out.angle_steers_des_deg, 0.0);

        let (out, _) = lc.step(&state(5.0, 0.0), &path(10.0), &vp, true);
        assert_eq!(out.angle_steers_des_deg, 3.0);

        let mut lc = ctrl(&vp);
        lc.step(&state(5.0, 0.0), &path(0.0), &vp, true);
        let (out, _) = lc.step(&state(5.0, 0.0), &path(2.0), &vp, true);
        assert_eq!(out.angle_steers_des_deg, 2.0);
    }

    #[test]
    fn test_pingpong_held_while_disabled() {
        let vp = vehicle(0.1, 0.0, 0.0);
        let mut lc = ctrl(&vp);

        lc.step(&state(5.0, 0.0), &path(0.0), &vp, true);

        // The filter does not see the desired angle while disabled
        let (out, _) = lc.step(&state(5.0, 0.0), &path(10.0), &vp, false);
        assert_eq!(out.angle_steers_des_deg, 0.0);

        let (out, _) = lc.step(&state(5.0, 0.0), &path(10.0), &vp, true);
        assert_eq!(out.angle_steers_des_deg, 3.0);
    }

    #[test]
    fn test_diagnostic() {
        let vp = vehicle(5.0, 0.0, 0.0);
        let mut lc = ctrl(&vp);

        let s = VehicleState {
            steer_rate_degs: 1.5,
            ..state(5.0, -1.0)
        };
        let (_, report) = lc.step(&s, &path(0.0), &vp, false);
        assert_eq!(report, LatPidState {
            steer_angle: -1.0,
            steer_rate: 1.5,
            active: false,
            p: None,
            i: None,
            f: None,
            output: None,
            saturated: None
        });

        // Saturation isn't checked at low speed
        let (_, report) = lc.step(&state(5.0, 0.0), &path(2.0), &vp, true);
        assert!(report.active);
        assert_eq!(report.p, Some(10.0));
        assert_eq!(report.output, Some(InterpSteerLimit.limit(&vp, 5.0)));
        assert_eq!(report.saturated, Some(false));

        let (_, report) = lc.step(&state(15.0, 0.0), &path(2.0), &vp, true);
        assert_eq!(report.saturated, Some(true));

        // Nor while the driver is overriding or the actuator rate limiting
        let s = VehicleState {
            steer_pressed: true,
            ..state(15.0, 0.0)
        };
        assert_eq!(lc.step(&s, &path(2.0), &vp, true).1.saturated, Some(false));

        let s = VehicleState {
            steer_rate_limited: true,
            ..state(15.0, 0.0)
        };
        assert_eq!(lc.step(&s, &path(2.0), &vp, true).1.saturated, Some(false));
    }

    #[test]
    fn test_override_freezes_integrator() {
        let vp = vehicle(0.1, 1.0, 0.0);
        let mut lc = ctrl(&vp);

        for _ in 0..10 {
            lc.step(&state(15.0, 0.0), &path(1.0), &vp, true);
        }
        let i = lc.pid().i();
        assert!(i > 0.0);

        let s = VehicleState {
            steer_pressed: true,
            ..state(15.0, 0.0)
        };
        for _ in 0..10 {
            let (out, report) = lc.step(&s, &path(1.0), &vp, true);
            assert_eq!(report.i, Some(i));
            assert!(out.steer_cmd > 0.0);
        }
    }

    #[test]
    fn test_initial_tuning() {
        let vp = vehicle(0.1, 0.0, 0.0);
        let provider = MockProvider {
            responses: vec![Some(TuningOverrides {
                deadzone: 0.2,
                gains_enabled: false,
                gains: None
            })].into()
        };

        let lc = LatCtrl::new(&vp, Params::default(), Box::new(provider)).unwrap();
        assert_eq!(lc.controller_params().deadzone_deg(), 0.2);
    }

    #[test]
    fn test_periodic_tuning() {
        let vp = vehicle(1.0, 0.0, 0.0);
        let provider = MockProvider {
            responses: vec![
                None,
                Some(TuningOverrides {
                    deadzone: 0.5,
                    gains_enabled: false,
                    gains: None
                })
            ].into()
        };
        let mut lc = LatCtrl::new(&vp, Params::default(), Box::new(provider)).unwrap();

        // The timer runs while disengaged
        for _ in 0..(TUNING_RELOAD_PERIOD_CYCLES - 1) {
            lc.step(&state(5.0, 0.0), &path(0.4), &vp, false);
        }
        assert_eq!(lc.controller_params().deadzone_deg(), 0.0);

        let (_, report) = lc.step(&state(5.0, 0.0), &path(0.4), &vp, true);
        assert_eq!(lc.controller_params().deadzone_deg(), 0.5);

        // The new deadzone applies to the cycle that loaded it
        assert_eq!(report.p, Some(0.0));
    }
}
