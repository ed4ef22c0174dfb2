//! Error types for the fan controller

use std::time::Duration;
use thiserror::Error;

/// Result type alias for the fan controller
pub type Result<T> = std::result::Result<T, FanControlError>;

/// Main error type for the fan controller
#[derive(Error, Debug)]
pub enum FanControlError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Sensor error: {0}")]
    Sensor(String),

    #[error("Sensor read timed out after {0:?}")]
    SensorTimeout(Duration),

    #[error("PWM error: {0}")]
    Pwm(String),
}

impl FanControlError {
    /// Errors the control loop may skip a tick on instead of stopping.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Sensor(_) | Self::SensorTimeout(_))
    }
}
