//! Fan output abstraction

use crate::errors::Result;
use crate::hysteresis::FanLevel;
use std::fmt;

/// Physical fan driven by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FanChannel {
    Cpu,
    Disk,
}

impl FanChannel {
    pub const ALL: [FanChannel; 2] = [FanChannel::Cpu, FanChannel::Disk];

    pub fn index(self) -> usize {
        match self {
            FanChannel::Cpu => 0,
            FanChannel::Disk => 1,
        }
    }
}

impl fmt::Display for FanChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanChannel::Cpu => write!(f, "cpu"),
            FanChannel::Disk => write!(f, "disk"),
        }
    }
}

/// Something that can set a fan to a discrete level
pub trait FanOutput {
    /// Commit `level` to the fan on `channel`. Repeating a call is harmless.
    fn apply(&mut self, channel: FanChannel, level: FanLevel) -> Result<()>;

    /// Release the underlying hardware handles.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Duty cycle for `level`, mapped linearly so that `Max` is the full period
pub fn duty_cycle_ns(period_ns: u64, level: FanLevel) -> u64 {
    period_ns * u64::from(level.as_u8()) / FanLevel::STEPS
}
