//! Automatic fan control loop
//!
//! Polls the temperature sensor on a fixed cadence, runs the hysteresis
//! selector and pushes level changes to both fans. The loop is the only
//! writer of the current level.

use crate::config::ControllerConfig;
use crate::errors::{FanControlError, Result};
use crate::fan_output::{FanChannel, FanOutput};
use crate::hysteresis::{FanLevel, HysteresisConfig};
use crate::thermal::TemperatureSensor;
use log::{info, trace, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

/// What a single control tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The sensor could not be read; nothing changed.
    Skipped,
    /// The selected level matched the current one; no hardware writes.
    Unchanged(FanLevel),
    /// Both fans were moved to a new level.
    Changed {
        from: FanLevel,
        to: FanLevel,
        temperature: f64,
    },
}

/// Hysteresis fan controller driving both fan outputs
pub struct FanController<S, O> {
    thresholds: HysteresisConfig,
    poll_interval: Duration,
    sensor_timeout: Duration,
    sensor: Arc<S>,
    output: O,
    current_level: FanLevel,
    /// Read that outlived its timeout; awaited again instead of starting another
    pending_read: Option<JoinHandle<Result<f64>>>,
}

impl<S, O> FanController<S, O>
where
    S: TemperatureSensor,
    O: FanOutput,
{
    /// Create a controller. The level starts at `Off` until the first tick.
    pub fn new(config: &ControllerConfig, sensor: S, output: O) -> Self {
        Self {
            thresholds: config.thresholds,
            poll_interval: config.poll_interval(),
            sensor_timeout: config.sensor_timeout(),
            sensor: Arc::new(sensor),
            output,
            current_level: FanLevel::Off,
            pending_read: None,
        }
    }

    pub fn current_level(&self) -> FanLevel {
        self.current_level
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Hand back the outputs so the caller can release them
    pub fn into_output(self) -> O {
        self.output
    }

    /// Whether a timed-out sensor read is still running
    pub fn read_in_flight(&self) -> bool {
        self.pending_read.is_some()
    }

    /// Read the sensor off the async thread, bounded by the sensor timeout.
    ///
    /// At most one read runs at a time: a read that times out is kept and
    /// waited on again by the next tick.
    async fn read_temperature(&mut self) -> Result<f64> {
        let mut read = match self.pending_read.take() {
            Some(read) => read,
            None => {
                let sensor = Arc::clone(&self.sensor);
                tokio::task::spawn_blocking(move || sensor.read_celsius())
            }
        };

        match timeout(self.sensor_timeout, &mut read).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(FanControlError::Sensor(format!("Sensor task failed: {}", e))),
            Err(_) => {
                self.pending_read = Some(read);
                Err(FanControlError::SensorTimeout(self.sensor_timeout))
            }
        }
    }

    /// Run one control iteration
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let temperature = match self.read_temperature().await {
            Ok(temperature) => temperature,
            Err(e) if e.is_transient() => {
                warn!("Skipping tick, temperature unavailable: {}", e);
                return Ok(TickOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        let level = self
            .thresholds
            .select_level(temperature, self.current_level);

        if level == self.current_level {
            trace!("Temperature {:.1}°C, staying at level {}", temperature, level);
            return Ok(TickOutcome::Unchanged(level));
        }

        info!(
            "Current temperature is {:.1}°C (buffer: {:.1}°C), level {} -> {}",
            temperature, self.thresholds.buffer, self.current_level, level
        );
        for channel in FanChannel::ALL {
            self.output.apply(channel, level)?;
        }

        let from = self.current_level;
        self.current_level = level;
        Ok(TickOutcome::Changed {
            from,
            to: level,
            temperature,
        })
    }

    /// Tick until `cancel` fires. Output failures stop the loop.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        info!(
            "Starting automatic fan control (min {:.1}°C, med {:.1}°C, max {:.1}°C, buffer {:.1}°C, every {:?})",
            self.thresholds.min,
            self.thresholds.med,
            self.thresholds.max,
            self.thresholds.buffer,
            self.poll_interval
        );

        while !cancel.is_cancelled() {
            self.tick().await?;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!("Automatic fan control stopped at level {}", self.current_level);
        Ok(())
    }
}
