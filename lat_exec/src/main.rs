//! Lateral control executable entry point.
//!
//! # Architecture
//!
//! The executable replays a drive script through lateral control:
//!
//!     - Initialise the session, logger and parameters
//!     - Initialise LatCtrl and its archives
//!     - Main loop, once per drive script row:
//!         - LatCtrl processing
//!         - Archive writing
//!         - Cycle management
//!     - Save the final live parameters
//!
//! # Usage
//!
//! ```text
//! lat_exec <drive_script.csv>
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use lat_lib::{
    drive_script::DriveScript,
    lat_ctrl::{
        FileTuningProvider, LatCtrl, NoTuning, Params, TuningProvider,
        VehicleParams}};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    session::Session};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "lat_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Lateral Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let vehicle_params: VehicleParams = util::params::load("vehicle.toml")
        .wrap_err("Could not load vehicle params")?;

    let params: Params = util::params::load("lat_ctrl.toml")
        .wrap_err("Could not load LatCtrl params")?;

    info!("Exec parameters loaded");

    // ---- LOAD DRIVE SCRIPT ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected the path to a drive script as the only argument, found {} arguments",
            args.len().saturating_sub(1)
        ));
    }

    info!("Loading drive script from \"{}\"", &args[1]);

    let script = DriveScript::new(&args[1])
        .wrap_err("Failed to load the drive script")?;

    info!(
        "Loaded drive script lasts {:.02} s and contains {} cycles\n",
        script.duration_s(params.cycle_period_s),
        script.len()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let tuning: Box<dyn TuningProvider> = match params.tuning_file {
        Some(ref f) => {
            let path = util::params::get_path(f)
                .wrap_err("Could not find the tuning file")?;
            info!("Live tuning enabled from {:?}", path);
            Box::new(FileTuningProvider::new(path))
        },
        None => {
            info!("Live tuning disabled");
            Box::new(NoTuning)
        }
    };

    let mut lat_ctrl = LatCtrl::new(&vehicle_params, params, tuning)
        .wrap_err("Failed to initialise LatCtrl")?;
    lat_ctrl.init_archives(&session)
        .wrap_err("Failed to initialise LatCtrl archives")?;
    info!("LatCtrl init complete");

    info!("Module initialisation complete\n");

    // Validated by LatCtrl
    let cycle_period = Duration::from_secs_f64(lat_ctrl.params().cycle_period_s);

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut num_active_cycles = 0u64;
    let mut num_saturated_cycles = 0u64;
    let mut num_cycle_overruns = 0u64;

    for cycle in script.iter() {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- CONTROL ALGORITHM PROCESSING ----

        let (_, report) = lat_ctrl.step(
            &cycle.vehicle_state(),
            &cycle.desired_path(),
            &vehicle_params,
            cycle.engaged
        );

        if report.active {
            num_active_cycles += 1;
        }
        if report.saturated == Some(true) {
            num_saturated_cycles += 1;
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = lat_ctrl.write() {
            warn!("Could not write LatCtrl archives: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                num_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("End of drive script reached");
    info!(
        "{} cycles run, {} active, {} saturated, {} overruns",
        script.len(),
        num_active_cycles,
        num_saturated_cycles,
        num_cycle_overruns
    );

    session.save("lat_ctrl/final_params.json", lat_ctrl.controller_params().clone());
    session.exit();

    info!("End of execution");

    Ok(())
}
