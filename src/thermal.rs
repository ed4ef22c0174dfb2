//! Temperature sensor access

use crate::errors::{FanControlError, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

/// Source of the current temperature in degrees Celsius
pub trait TemperatureSensor: Send + Sync + 'static {
    /// Read the current temperature. Failures are treated as transient.
    fn read_celsius(&self) -> Result<f64>;
}

/// Sysfs thermal zone, e.g. `/sys/class/thermal/thermal_zone0/temp`
///
/// The file holds millidegrees Celsius.
#[derive(Debug, Clone)]
pub struct ThermalZoneSensor {
    path: PathBuf,
}

impl ThermalZoneSensor {
    /// Open the sensor, failing if the file cannot be read right now.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::read_to_string(&path).map_err(|e| {
            FanControlError::Config(format!(
                "Temperature sensor {} is not readable: {}",
                path.display(),
                e
            ))
        })?;

        info!("Temperature sensor initialized: {}", path.display());
        Ok(Self { path })
    }
}

impl TemperatureSensor for ThermalZoneSensor {
    fn read_celsius(&self) -> Result<f64> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            FanControlError::Sensor(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        parse_millidegrees(&content)
    }
}

/// Convert a sysfs millidegree reading to degrees Celsius
pub fn parse_millidegrees(content: &str) -> Result<f64> {
    let millidegrees: f64 = content.trim().parse().map_err(|_| {
        FanControlError::Sensor(format!("Failed to parse temperature: {:?}", content.trim()))
    })?;

    Ok(millidegrees / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_millidegrees() {
        assert_eq!(parse_millidegrees("42000\n").unwrap(), 42.0);
        assert_eq!(parse_millidegrees("-5500").unwrap(), -5.5);
        assert!(matches!(
            parse_millidegrees("not a number"),
            Err(FanControlError::Sensor(_))
        ));
        assert!(parse_millidegrees("").is_err());
    }

    #[test]
    fn test_thermal_zone_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        fs::write(&path, "51234\n").unwrap();

        let sensor = ThermalZoneSensor::open(&path).unwrap();
        assert_eq!(sensor.read_celsius().unwrap(), 51.234);

        fs::write(&path, "garbage").unwrap();
        assert!(sensor.read_celsius().unwrap_err().is_transient());

        fs::remove_file(&path).unwrap();
        assert!(sensor.read_celsius().unwrap_err().is_transient());
    }

    #[test]
    fn test_missing_sensor_fails_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let result = ThermalZoneSensor::open(dir.path().join("missing"));
        assert!(matches!(result, Err(FanControlError::Config(_))));
    }
}
