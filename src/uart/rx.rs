//! Receive engine.
//!
//! Decodes the serial line into data words one clock tick at a time:
//! detect a start edge, confirm it half a bit period later, sample each
//! data bit at its midpoint, check the stop bits, and expose the
//! assembled word for a single tick.  A stop bit sampled low is a framing
//! error; the engine holds its error flag through a timed backoff window
//! and then resynchronizes from scratch.  The raw line passes through an
//! embedded [`Synchronizer`] before the state machine sees it.

use crate::uart::synchro::Synchronizer;
use crate::uart::timing::{BitTiming, ConfigError, FrameConfig};
use log::{debug, trace};

/// Receive state machine phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RxPhase {
    /// Wait for the line to read idle-high before arming edge detection.
    Reset,
    /// Line idle, watch for a falling edge.
    Idle,
    /// Candidate start bit, confirm at the half-bit midpoint.
    Start,
    /// Sample data bits at bit-period midpoints, LSB first.
    Data,
    /// Check that every stop bit samples high.
    Stop,
    /// Expose the completed word for one tick.
    Flush,
    /// Hold the error flag through the backoff window.
    Error,
}

/// Outputs of one receiver tick.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct RxOutput {
    /// A frame is in flight.
    pub active: bool,
    /// `chunk` carries a completed word, this tick only.
    pub valid: bool,
    /// A framing-error backoff window is in effect.
    pub error: bool,
    /// Completed word.  Zero unless `valid`.
    pub chunk: u16,
}

/// Serial line receiver.
#[derive(Debug)]
pub struct Receiver {
    config: FrameConfig,
    timing: BitTiming,
    synchro: Synchronizer,
    phase: RxPhase,
    /// Ticks counted within the current bit period.
    ticks: u32,
    /// Next data bit to sample.
    bit_index: u8,
    /// Next stop bit to check.
    stop_index: u8,
    /// Word assembled so far.
    word: u16,
    /// Ticks spent in the backoff window.
    backoff: u32,
}
impl Receiver {
    /// Create a receiver in the `Reset` phase.
    pub fn new(config: FrameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            timing: config.timing()?,
            synchro: Synchronizer::new(usize::from(config.sync_depth)),
            config,
            phase: RxPhase::Reset,
            ticks: 0,
            bit_index: 0,
            stop_index: 0,
            word: 0,
            backoff: 0,
        })
    }
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
    pub fn timing(&self) -> BitTiming {
        self.timing
    }
    /// Advance one clock tick.
    ///
    /// `reset` has priority over every phase: it forces the `Reset` phase
    /// on this tick and discards any frame in progress.  All runtime
    /// anomalies surface through the returned flags; this function never
    /// fails.
    pub fn step(&mut self, line_sample: bool, reset: bool) -> RxOutput {
        let sample = self.synchro.step(line_sample, reset);
        if reset {
            self.enter_reset();
            return RxOutput::default();
        }
        match self.phase {
            RxPhase::Reset => self.reset_tick(sample),
            RxPhase::Idle => self.idle_tick(sample),
            RxPhase::Start => self.start_tick(sample),
            RxPhase::Data => self.data_tick(sample),
            RxPhase::Stop => self.stop_tick(sample),
            RxPhase::Flush => self.flush_tick(),
            RxPhase::Error => self.error_tick(sample),
        }
    }
    fn enter_reset(&mut self) {
        self.phase = RxPhase::Reset;
        self.ticks = 0;
        self.bit_index = 0;
        self.stop_index = 0;
        self.word = 0;
        self.backoff = 0;
    }
    /// `Reset`: hold until the line reads idle-high, so a line still
    /// settling low cannot fake a start edge.
    fn reset_tick(&mut self, sample: bool) -> RxOutput {
        if sample {
            self.phase = RxPhase::Idle;
        }
        RxOutput::default()
    }
    /// `Idle`: a low sample is a candidate start edge.
    fn idle_tick(&mut self, sample: bool) -> RxOutput {
        if !sample {
            self.ticks = 0;
            self.phase = RxPhase::Start;
        }
        RxOutput::default()
    }
    /// `Start`: wait to the middle of the bit, then re-sample.  High again
    /// at the midpoint means a line glitch, not a frame; it is dropped
    /// without raising the error flag.
    fn start_tick(&mut self, sample: bool) -> RxOutput {
        if self.ticks < self.timing.half_cycles - 1 {
            self.ticks += 1;
        } else if sample {
            trace!("start candidate rejected as noise");
            self.phase = RxPhase::Idle;
        } else {
            self.ticks = 0;
            self.bit_index = 0;
            self.word = 0;
            self.phase = RxPhase::Data;
        }
        RxOutput { active: true, ..RxOutput::default() }
    }
    /// `Data`: sample each bit at its midpoint, LSB first.
    fn data_tick(&mut self, sample: bool) -> RxOutput {
        if self.ticks < self.timing.cycles_per_bit - 1 {
            self.ticks += 1;
        } else {
            self.ticks = 0;
            if sample {
                self.word |= 1 << self.bit_index;
            }
            trace!("data bit {} = {}", self.bit_index, u8::from(sample));
            if self.bit_index < self.config.data_width - 1 {
                self.bit_index += 1;
            } else {
                self.stop_index = 0;
                self.phase = RxPhase::Stop;
            }
        }
        RxOutput { active: true, ..RxOutput::default() }
    }
    /// `Stop`: every stop bit must sample high; a low sample means the
    /// frame boundary was lost.
    fn stop_tick(&mut self, sample: bool) -> RxOutput {
        if self.ticks < self.timing.cycles_per_bit - 1 {
            self.ticks += 1;
        } else if !sample {
            debug!("framing error: stop bit {} sampled low", self.stop_index);
            self.ticks = 0;
            self.backoff = 0;
            self.phase = RxPhase::Error;
        } else {
            self.ticks = 0;
            if self.stop_index < self.config.stop_width - 1 {
                self.stop_index += 1;
            } else {
                self.phase = RxPhase::Flush;
            }
        }
        RxOutput { active: true, ..RxOutput::default() }
    }
    /// `Flush`: the completed word is observable this tick only.
    fn flush_tick(&mut self) -> RxOutput {
        let chunk = self.word;
        debug!("received word {chunk:#05x}");
        self.word = 0;
        self.phase = RxPhase::Idle;
        RxOutput { active: false, valid: true, error: false, chunk }
    }
    /// `Error`: hold the error flag for `cycles_per_bit *
    /// error_backoff_intervals` ticks, then force a full
    /// resynchronization through `Reset` rather than jumping to `Idle`.
    fn error_tick(&mut self, sample: bool) -> RxOutput {
        let window = self.timing.cycles_per_bit * self.config.error_backoff_intervals;
        if self.backoff < window {
            self.backoff += 1;
            return RxOutput { error: true, ..RxOutput::default() };
        }
        debug!("framing error backoff expired");
        self.enter_reset();
        self.reset_tick(sample)
    }
}
