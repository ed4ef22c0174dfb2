//! Temperature-driven fan control
//!
//! Reads a thermal sensor once per interval and drives two PWM fans through
//! four speed levels, using per-level hysteresis to avoid flapping near a
//! threshold. Fans can also be pinned to a level from the command line.

pub mod args;
pub mod config;
pub mod controller;
pub mod errors;
pub mod fan_output;
pub mod hysteresis;
pub mod logging;
pub mod pwm;
pub mod shutdown;
pub mod thermal;

// Re-export commonly used types
pub use config::{ControllerConfig, PwmConfig};
pub use controller::{FanController, TickOutcome};
pub use errors::{FanControlError, Result};
pub use fan_output::{FanChannel, FanOutput};
pub use hysteresis::{FanLevel, HysteresisConfig, ThresholdSet};
pub use thermal::{TemperatureSensor, ThermalZoneSensor};
