//! Frame geometry and bit-period arithmetic.
//!
//! Both engines count clock ticks, never wall-clock time.  The clock/baud
//! ratio fixes how many ticks span one bit on the line; everything else
//! (midpoint sampling, stop-bit checks, error backoff) is derived from it.

use crate::utils::Fraction;
use std::time::Duration;
use thiserror::Error;

/// Invalid frame geometry, detected at construction and never retried.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("baud rate must be non-zero")]
    ZeroBaudRate,
    #[error("bit period of {0} ticks is too short for midpoint sampling (minimum 2)")]
    BitPeriodTooShort(u32),
    #[error("data width {0} is out of range (5..=9)")]
    DataWidth(u8),
    #[error("stop width {0} is out of range (1..=2)")]
    StopWidth(u8),
    #[error("synchronizer depth {0} is out of range (2..=3)")]
    SyncDepth(u8),
}

/// Immutable frame geometry shared by a receiver and a transmitter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Clock ticks per second.
    pub clock_rate: u32,
    /// Bits per second on the line.
    pub baud_rate: u32,
    /// Data bits per frame, 5 to 9.
    pub data_width: u8,
    /// Stop bits per frame, 1 or 2.
    pub stop_width: u8,
    /// Bit periods the receiver holds the error flag after a framing error.
    pub error_backoff_intervals: u32,
    /// Synchronizer stages between the raw line and the receiver, 2 or 3.
    pub sync_depth: u8,
}
impl Default for FrameConfig {
    /// Sane default communication: 9600 baud 8N1, 16x oversampling clock.
    fn default() -> Self {
        Self {
            clock_rate: 16 * 9_600,
            baud_rate: 9_600,
            data_width: 8,
            stop_width: 1,
            error_backoff_intervals: 4,
            sync_depth: 2,
        }
    }
}
impl FrameConfig {
    /// Check the geometry bounds the engines rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5..=9).contains(&self.data_width) {
            return Err(ConfigError::DataWidth(self.data_width));
        }
        if !(1..=2).contains(&self.stop_width) {
            return Err(ConfigError::StopWidth(self.stop_width));
        }
        if !(2..=3).contains(&self.sync_depth) {
            return Err(ConfigError::SyncDepth(self.sync_depth));
        }
        BitTiming::new(self.clock_rate, self.baud_rate)?;
        Ok(())
    }
    /// Tick counts for this geometry.
    pub fn timing(&self) -> Result<BitTiming, ConfigError> {
        BitTiming::new(self.clock_rate, self.baud_rate)
    }
    /// Word with the configured data width, all bits set.
    pub fn data_mask(&self) -> u16 {
        (1u16 << self.data_width) - 1
    }
}

/// Tick counts derived from the clock/baud ratio.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BitTiming {
    /// Clock ticks spanning one bit period.
    pub cycles_per_bit: u32,
    /// Clock ticks from a bit edge to its sampling midpoint.
    pub half_cycles: u32,
}
impl BitTiming {
    /// Derive tick counts from the clock/baud ratio.
    ///
    /// The division floors, like a fixed-point hardware baud divider; any
    /// remainder is accepted as quantization error.
    pub fn new(clock_rate: u32, baud_rate: u32) -> Result<Self, ConfigError> {
        if baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }
        let cycles_per_bit = clock_rate / baud_rate;
        if cycles_per_bit < 2 {
            return Err(ConfigError::BitPeriodTooShort(cycles_per_bit));
        }
        Ok(Self { cycles_per_bit, half_cycles: cycles_per_bit / 2 })
    }
    /// Baud rate actually realized after the divider floors.
    pub fn effective_baud(&self, clock_rate: u32) -> Fraction {
        Fraction(clock_rate, self.cycles_per_bit).reduce()
    }
    /// Wall-clock span of one realized bit period.
    pub fn bit_duration(&self, clock_rate: u32) -> Duration {
        self.effective_baud(clock_rate).invert().into()
    }
}
