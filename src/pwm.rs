//! Linux sysfs PWM fan outputs
//!
//! Each fan hangs off one channel of a PWM chip exposed under
//! `/sys/class/pwm/pwmchipN/pwmM`. Channels are exported, given a period and
//! enabled once at startup; afterwards only `duty_cycle` is written.

use crate::config::PwmConfig;
use crate::errors::{FanControlError, Result};
use crate::fan_output::{duty_cycle_ns, FanChannel, FanOutput};
use crate::hysteresis::FanLevel;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Default sysfs PWM class directory
pub const SYSFS_PWM_ROOT: &str = "/sys/class/pwm";

/// How often to check for a freshly exported channel directory
const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Attempts before giving up on an exported channel appearing
const EXPORT_POLL_ATTEMPTS: u32 = 50;

/// The two fan outputs on a sysfs PWM chip
#[derive(Debug)]
pub struct PwmOutputs {
    period_ns: u64,
    /// Indexed by `FanChannel::index`
    channels: [PathBuf; 2],
    released: bool,
}

impl PwmOutputs {
    /// Open both fan channels under the default sysfs root
    pub fn open(config: &PwmConfig) -> Result<Self> {
        Self::open_at(Path::new(SYSFS_PWM_ROOT), config)
    }

    /// Open both fan channels under `root`
    pub fn open_at(root: &Path, config: &PwmConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing PWM outputs on pwmchip{}...", config.chip);

        let chip_dir = root.join(format!("pwmchip{}", config.chip));
        if !chip_dir.is_dir() {
            return Err(FanControlError::Pwm(format!(
                "PWM chip not found: {}",
                chip_dir.display()
            )));
        }

        let period_ns = config.period_ns();
        let cpu = open_channel(&chip_dir, config.cpu_channel, period_ns)?;
        let disk = open_channel(&chip_dir, config.disk_channel, period_ns)?;

        info!(
            "PWM outputs ready: cpu={}, disk={}, period={}ns",
            cpu.display(),
            disk.display(),
            period_ns
        );

        Ok(Self {
            period_ns,
            channels: [cpu, disk],
            released: false,
        })
    }

    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    pub fn channel_path(&self, channel: FanChannel) -> &Path {
        &self.channels[channel.index()]
    }
}

impl FanOutput for PwmOutputs {
    fn apply(&mut self, channel: FanChannel, level: FanLevel) -> Result<()> {
        if self.released {
            return Err(FanControlError::Pwm(
                "PWM outputs already released".to_string(),
            ));
        }

        let duty = duty_cycle_ns(self.period_ns, level);
        write_attr(self.channel_path(channel), "duty_cycle", duty)?;

        info!("Setting {} fan to level {} ({}ns duty)", channel, level, duty);
        Ok(())
    }

    /// Drop the channel handles. The last duty cycle stays in effect.
    fn release(&mut self) -> Result<()> {
        if !self.released {
            info!("Releasing PWM outputs");
            self.released = true;
        }
        Ok(())
    }
}

fn open_channel(chip_dir: &Path, channel: u32, period_ns: u64) -> Result<PathBuf> {
    let dir = chip_dir.join(format!("pwm{}", channel));

    if !dir.is_dir() {
        debug!("Exporting PWM channel {} on {}", channel, chip_dir.display());
        write_attr(chip_dir, "export", channel)?;
        wait_for_export(&dir)?;
    }

    // the kernel rejects a period shorter than the current duty cycle
    if let Some(duty) = read_attr(&dir, "duty_cycle") {
        if duty > period_ns {
            write_attr(&dir, "duty_cycle", 0)?;
        }
    }

    write_attr(&dir, "period", period_ns)?;
    write_attr(&dir, "enable", 1)?;
    Ok(dir)
}

fn wait_for_export(dir: &Path) -> Result<()> {
    for _ in 0..EXPORT_POLL_ATTEMPTS {
        if dir.is_dir() {
            return Ok(());
        }
        thread::sleep(EXPORT_POLL_INTERVAL);
    }

    Err(FanControlError::Pwm(format!(
        "Exported channel did not appear: {}",
        dir.display()
    )))
}

fn write_attr(dir: &Path, name: &str, value: impl ToString) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, value.to_string())
        .map_err(|e| FanControlError::Pwm(format!("Failed to write {}: {}", path.display(), e)))
}

fn read_attr(dir: &Path, name: &str) -> Option<u64> {
    fs::read_to_string(dir.join(name))
        .ok()
        .and_then(|content| content.trim().parse().ok())
}
