//! Main entry point for the fan controller

use anyhow::Context;
use clap::Parser;
use fan_control::{
    args::{Args, Mode},
    logging,
    pwm::PwmOutputs,
    shutdown, ControllerConfig, FanController, FanOutput, ThermalZoneSensor,
};
use log::info;
use tokio_util::sync::CancellationToken;

fn main() -> anyhow::Result<()> {
    // Print version and build metadata for binary identity verification
    let pkg_version = env!("CARGO_PKG_VERSION");
    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    let build_time = option_env!("BUILD_TIME").unwrap_or("unknown");
    eprintln!(
        "fan-control v{} (git {}) built {}",
        pkg_version, git_hash, build_time
    );

    let args = Args::parse();
    logging::setup(args.verbose, args.quiet)?;

    // Usage and configuration errors surface before any hardware is touched
    let mode = args.mode()?;
    let config = ControllerConfig::load(args.config.as_deref())?;

    // Built by hand so exit is not held up by a sensor read that never returns
    let runtime = shutdown::build_runtime()?;
    let result = runtime.block_on(execute(mode, &config));
    shutdown::shutdown_runtime(runtime);
    result
}

async fn execute(mode: Mode, config: &ControllerConfig) -> anyhow::Result<()> {
    match mode {
        Mode::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        Mode::Manual { target, level } => {
            let mut outputs =
                PwmOutputs::open(&config.pwm).context("Failed to open PWM outputs")?;
            for channel in target.channels() {
                outputs.apply(*channel, level)?;
            }
            outputs.release()?;
        }
        Mode::Auto => run_auto(config).await?,
    }

    Ok(())
}

/// Run the control loop until SIGINT/SIGTERM, then release the outputs
async fn run_auto(config: &ControllerConfig) -> anyhow::Result<()> {
    let sensor = ThermalZoneSensor::open(&config.sensor_path)?;
    let outputs = PwmOutputs::open(&config.pwm).context("Failed to open PWM outputs")?;

    let cancel = CancellationToken::new();
    let listener = shutdown::spawn_signal_listener(cancel.clone());

    let mut controller = FanController::new(config, sensor, outputs);
    let result = controller.run(cancel.clone()).await;

    cancel.cancel();
    let _ = listener.await;

    let mut outputs = controller.into_output();
    outputs.release()?;
    result?;

    info!("Exiting...");
    Ok(())
}
