//! # Lateral Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::{eqpt::car::VehicleState, plan::DesiredPath};
use lat_lib::lat_ctrl::{
    GainCurves, GainSchedule, LatCtrl, NoTuning, Params, SteerControlType, VehicleParams,
};

fn lat_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a representative vehicle and controller ----

    let vehicle_params = VehicleParams {
        steer_control_type: SteerControlType::Torque,
        steer_max_bp: vec![0.0, 10.0, 20.0, 30.0],
        steer_max_v: vec![1.0, 0.9, 0.75, 0.6],
        lateral_tuning: GainCurves {
            kp: GainSchedule::new(vec![0.0, 9.0, 20.0, 30.0], vec![0.1, 0.15, 0.2, 0.25]).unwrap(),
            ki: GainSchedule::new(vec![0.0, 9.0, 20.0, 30.0], vec![0.01, 0.02, 0.03, 0.05]).unwrap(),
            kd: GainSchedule::constant(0.002),
            kf: 0.00004,
        },
    };

    let mut lat_ctrl = LatCtrl::new(&vehicle_params, Params::default(), Box::new(NoTuning)).unwrap();

    let vehicle_state = VehicleState {
        v_ego_ms: 22.0,
        steer_angle_deg: 1.5,
        steer_rate_degs: -0.8,
        steer_pressed: false,
        steer_rate_limited: false,
    };
    let desired_path = DesiredPath {
        angle_steers_deg: 2.5,
        angle_offset_deg: 0.3,
    };

    // Bench a single active cycle, which also counts towards the tuning reload
    c.bench_function("LatCtrl::step", |b| {
        b.iter(|| {
            lat_ctrl.step(
                black_box(&vehicle_state),
                black_box(&desired_path),
                &vehicle_params,
                true,
            )
        })
    });
}

criterion_group!(benches, lat_ctrl_benchmark);
criterion_main!(benches);
