//! Command line argument parsing for the fan controller

use crate::errors::{FanControlError, Result};
use crate::fan_output::FanChannel;
use crate::hysteresis::FanLevel;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Temperature-driven fan controller
///
/// Sets the CPU and disk fans to a fixed level (0-4), or runs the automatic
/// hysteresis control loop until interrupted.
#[derive(Parser, Debug)]
#[command(name = "fan-control")]
#[command(about = "Temperature-driven PWM fan control")]
#[command(version)]
pub struct Args {
    /// Which fans to set, or `auto` for the control loop
    #[arg(value_enum, required_unless_present = "print_config")]
    pub target: Option<Target>,

    /// Fan level 0-4 (larger values are clamped); ignored by `auto`
    pub level: Option<u64>,

    /// JSON configuration file, applied before environment overrides
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// CPU fan only
    Cpu,
    /// Disk fan only
    Disk,
    /// Both fans
    All,
    /// Automatic control loop
    Auto,
}

impl Target {
    /// Fans affected by this target
    pub fn channels(self) -> &'static [FanChannel] {
        match self {
            Target::Cpu => &[FanChannel::Cpu],
            Target::Disk => &[FanChannel::Disk],
            Target::All | Target::Auto => &FanChannel::ALL,
        }
    }
}

/// What the process should do once arguments are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    PrintConfig,
    Manual { target: Target, level: FanLevel },
    Auto,
}

impl Args {
    /// Resolve the invocation mode, rejecting manual targets without a level
    pub fn mode(&self) -> Result<Mode> {
        if self.print_config {
            return Ok(Mode::PrintConfig);
        }

        match self.target {
            Some(Target::Auto) => Ok(Mode::Auto),
            Some(target) => {
                let raw = self.level.ok_or_else(|| {
                    FanControlError::Usage(format!(
                        "a level (0-4) is required for target {:?}",
                        target
                    ))
                })?;
                Ok(Mode::Manual {
                    target,
                    level: FanLevel::clamped(raw),
                })
            }
            None => Err(FanControlError::Usage(
                "expected one of <auto | cpu | disk | all>".to_string(),
            )),
        }
    }
}
