//! Startup configuration
//!
//! Values are resolved once, in order: built-in defaults, an optional JSON
//! file, then environment variables. Nothing mutates the result afterwards.

use crate::errors::{FanControlError, Result};
use crate::hysteresis::HysteresisConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_TEMP_MIN: &str = "TEMP_MIN";
pub const ENV_TEMP_MED: &str = "TEMP_MED";
pub const ENV_TEMP_MAX: &str = "TEMP_MAX";
pub const ENV_TEMP_BUFFER: &str = "TEMP_BUFFER";
pub const ENV_POLL_INTERVAL_MS: &str = "FAN_POLL_INTERVAL_MS";
pub const ENV_SENSOR_TIMEOUT_MS: &str = "FAN_SENSOR_TIMEOUT_MS";
pub const ENV_TEMP_SENSOR: &str = "FAN_TEMP_SENSOR";
pub const ENV_PWM_CHIP: &str = "FAN_PWM_CHIP";
pub const ENV_CPU_CHANNEL: &str = "FAN_CPU_CHANNEL";
pub const ENV_DISK_CHANNEL: &str = "FAN_DISK_CHANNEL";
pub const ENV_PWM_FREQUENCY: &str = "FAN_PWM_FREQUENCY";

/// Highest accepted PWM frequency; keeps the period at 1000ns or more
pub const MAX_PWM_FREQUENCY_HZ: u32 = 1_000_000;

/// Linux sysfs PWM channel assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PwmConfig {
    pub chip: u32,
    pub cpu_channel: u32,
    pub disk_channel: u32,
    pub frequency_hz: u32,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            chip: 0,
            cpu_channel: 0,
            disk_channel: 1,
            frequency_hz: 100_000,
        }
    }
}

impl PwmConfig {
    /// Check the frequency range and that the fans use distinct channels
    pub fn validate(&self) -> Result<()> {
        if self.frequency_hz == 0 || self.frequency_hz > MAX_PWM_FREQUENCY_HZ {
            return Err(FanControlError::Config(format!(
                "PWM frequency must be between 1 and {} Hz, got {}",
                MAX_PWM_FREQUENCY_HZ, self.frequency_hz
            )));
        }
        if self.cpu_channel == self.disk_channel {
            return Err(FanControlError::Config(format!(
                "CPU and disk fans cannot share PWM channel {}",
                self.cpu_channel
            )));
        }
        Ok(())
    }

    /// PWM period in nanoseconds. Only meaningful on a validated config.
    pub fn period_ns(&self) -> u64 {
        1_000_000_000 / u64::from(self.frequency_hz)
    }
}

/// Everything the controller needs, fixed at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub thresholds: HysteresisConfig,
    pub poll_interval_ms: u64,
    pub sensor_timeout_ms: u64,
    pub sensor_path: PathBuf,
    pub pwm: PwmConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            thresholds: HysteresisConfig::default(),
            poll_interval_ms: 1000,
            sensor_timeout_ms: 500,
            sensor_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            pwm: PwmConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Resolve the configuration from an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::resolve(path, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration using `lookup` in place of the environment
    pub fn resolve<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let json = fs::read_to_string(path).map_err(|e| {
            FanControlError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ControllerConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Apply environment-style overrides on top of the current values
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_with(&lookup, ENV_TEMP_MIN, &mut self.thresholds.min)?;
        override_with(&lookup, ENV_TEMP_MED, &mut self.thresholds.med)?;
        override_with(&lookup, ENV_TEMP_MAX, &mut self.thresholds.max)?;
        override_with(&lookup, ENV_TEMP_BUFFER, &mut self.thresholds.buffer)?;
        override_with(&lookup, ENV_POLL_INTERVAL_MS, &mut self.poll_interval_ms)?;
        override_with(&lookup, ENV_SENSOR_TIMEOUT_MS, &mut self.sensor_timeout_ms)?;
        override_with(&lookup, ENV_TEMP_SENSOR, &mut self.sensor_path)?;
        override_with(&lookup, ENV_PWM_CHIP, &mut self.pwm.chip)?;
        override_with(&lookup, ENV_CPU_CHANNEL, &mut self.pwm.cpu_channel)?;
        override_with(&lookup, ENV_DISK_CHANNEL, &mut self.pwm.disk_channel)?;
        override_with(&lookup, ENV_PWM_FREQUENCY, &mut self.pwm.frequency_hz)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        if self.poll_interval_ms == 0 {
            return Err(FanControlError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.sensor_timeout_ms == 0 {
            return Err(FanControlError::Config(
                "sensor timeout must be greater than zero".to_string(),
            ));
        }
        self.pwm.validate()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_millis(self.sensor_timeout_ms)
    }
}

fn override_with<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = raw.trim().parse().map_err(|_| {
            FanControlError::Config(format!("Invalid value for {}: {:?}", key, raw))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::resolve(None, env(&[])).unwrap();
        assert_eq!(config.thresholds, HysteresisConfig::new(35.0, 50.0, 55.0, 2.0).unwrap());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.pwm.period_ns(), 10_000);
    }

    #[test]
    fn test_env_overrides() {
        let config = ControllerConfig::resolve(
            None,
            env(&[
                ("TEMP_MIN", "40"),
                ("TEMP_MED", " 45.5 "),
                ("TEMP_MAX", "60.0"),
                ("TEMP_BUFFER", "3"),
                ("FAN_TEMP_SENSOR", "/tmp/temp"),
                ("FAN_PWM_CHIP", "2"),
            ]),
        )
        .unwrap();
        assert_eq!(config.thresholds.min, 40.0);
        assert_eq!(config.thresholds.med, 45.5);
        assert_eq!(config.thresholds.max, 60.0);
        assert_eq!(config.thresholds.buffer, 3.0);
        assert_eq!(config.sensor_path, PathBuf::from("/tmp/temp"));
        assert_eq!(config.pwm.chip, 2);
    }

    #[test]
    fn test_malformed_value_fails_fast() {
        let err = ControllerConfig::resolve(None, env(&[("TEMP_MAX", "hot")])).unwrap_err();
        assert!(err.to_string().contains("TEMP_MAX"));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let result = ControllerConfig::resolve(None, env(&[("TEMP_MIN", "52")]));
        assert!(matches!(result, Err(FanControlError::Config(_))));
    }

    #[test]
    fn test_shared_channel_rejected() {
        let result = ControllerConfig::resolve(None, env(&[("FAN_DISK_CHANNEL", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_pwm_frequency_bounds() {
        for raw in ["0", "1000001", "2000000000"] {
            let result = ControllerConfig::resolve(None, env(&[("FAN_PWM_FREQUENCY", raw)]));
            assert!(matches!(result, Err(FanControlError::Config(_))), "{}", raw);
        }

        let config =
            ControllerConfig::resolve(None, env(&[("FAN_PWM_FREQUENCY", "1000000")])).unwrap();
        assert_eq!(config.pwm.period_ns(), 1_000);
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "thresholds": { "min": 30.0, "med": 40.0, "max": 70.0, "buffer": 1.5 },
                 "poll_interval_ms": 250 }"#,
        )
        .unwrap();

        let config = ControllerConfig::resolve(Some(&path), env(&[("TEMP_MAX", "65")])).unwrap();
        assert_eq!(config.thresholds.min, 30.0);
        assert_eq!(config.thresholds.max, 65.0);
        assert_eq!(config.poll_interval_ms, 250);
        // untouched sections keep their defaults
        assert_eq!(config.pwm, PwmConfig::default());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ControllerConfig::resolve(Some(Path::new("/nonexistent/fan.json")), env(&[]));
        assert!(matches!(result, Err(FanControlError::Config(_))));
    }
}
