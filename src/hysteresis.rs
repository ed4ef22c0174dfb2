//! Discrete fan levels and the hysteresis level selector
//!
//! The thresholds used to pick the next level depend on the level the fans
//! are already running at. Falling back below a boundary requires the
//! temperature to drop `buffer` degrees further than rising above it did.

use crate::errors::{FanControlError, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete fan speed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FanLevel {
    /// Fans stopped. Only reachable through a manual override.
    #[default]
    Off = 0,
    Idle = 1,
    Low = 2,
    High = 3,
    Max = 4,
}

impl FanLevel {
    pub const ALL: [FanLevel; 5] = [
        FanLevel::Off,
        FanLevel::Idle,
        FanLevel::Low,
        FanLevel::High,
        FanLevel::Max,
    ];

    /// Number of steps above `Off`; used as the duty cycle denominator.
    pub const STEPS: u64 = 4;

    /// Build a level from a raw number, saturating at `Max`.
    pub fn clamped(raw: u64) -> Self {
        match raw {
            0 => FanLevel::Off,
            1 => FanLevel::Idle,
            2 => FanLevel::Low,
            3 => FanLevel::High,
            _ => FanLevel::Max,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FanLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Breakpoints between levels 1↔2, 2↔3 and 3↔4
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSet {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

/// Threshold constants in degrees Celsius, fixed for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub buffer: f64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            min: 35.0,
            med: 50.0,
            max: 55.0,
            buffer: 2.0,
        }
    }
}

impl HysteresisConfig {
    /// Create a validated threshold configuration
    pub fn new(min: f64, med: f64, max: f64, buffer: f64) -> Result<Self> {
        let config = Self {
            min,
            med,
            max,
            buffer,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check MIN < MED < MAX and BUFFER >= 0, all finite
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("min", self.min),
            ("med", self.med),
            ("max", self.max),
            ("buffer", self.buffer),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FanControlError::Config(format!(
                "threshold {} must be finite, got {}",
                name, value
            )));
        }

        if !(self.min < self.med && self.med < self.max) {
            return Err(FanControlError::Config(format!(
                "thresholds must satisfy min < med < max, got {} / {} / {}",
                self.min, self.med, self.max
            )));
        }

        if self.buffer < 0.0 {
            return Err(FanControlError::Config(format!(
                "buffer must not be negative, got {}",
                self.buffer
            )));
        }

        Ok(())
    }

    /// Breakpoints to use when the fans currently run at `current`.
    ///
    /// The buffer only lowers the boundary directly below `current`.
    /// `Off` (the startup sentinel or a manual stop) uses the level 1 table.
    pub fn thresholds_for(&self, current: FanLevel) -> ThresholdSet {
        let (low, mid, high) = match current {
            FanLevel::Off | FanLevel::Idle => (self.min, self.med, self.max),
            FanLevel::Low => (self.min - self.buffer, self.med, self.max),
            FanLevel::High => (self.min, self.med - self.buffer, self.max),
            FanLevel::Max => (self.min, self.med, self.max - self.buffer),
        };
        ThresholdSet { low, mid, high }
    }

    /// Pick the level for the next tick.
    ///
    /// A temperature sitting exactly on a breakpoint resolves to the higher
    /// level. Never returns `Off`. A non-finite reading returns `Idle`.
    pub fn select_level(&self, temperature: f64, current: FanLevel) -> FanLevel {
        if !temperature.is_finite() {
            warn!(
                "Ignoring non-finite temperature reading {}, falling back to level {}",
                temperature,
                FanLevel::Idle
            );
            return FanLevel::Idle;
        }

        let t = self.thresholds_for(current);

        if temperature >= t.high {
            FanLevel::Max
        } else if temperature >= t.mid {
            FanLevel::High
        } else if temperature >= t.low {
            FanLevel::Low
        } else {
            FanLevel::Idle
        }
    }
}
