//! Receive/transmit pair.
//!
//! Wires one [`Receiver`] and one [`Transmitter`] to the same tick and
//! reset.  No logic of its own: the loopback step only ties the transmit
//! line back to the receive input for self-test, like a loopback mode
//! tying the transmit shift register to the receive shift register.

use crate::uart::rx::{Receiver, RxOutput};
use crate::uart::timing::{ConfigError, FrameConfig};
use crate::uart::tx::{Transmitter, TxOutput};

/// One receive engine and one transmit engine on a shared clock and reset.
#[derive(Debug)]
pub struct Duplex {
    pub rx: Receiver,
    pub tx: Transmitter,
}

/// Outputs of one duplex tick.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct DuplexOutput {
    pub rx: RxOutput,
    pub tx: TxOutput,
}

impl Duplex {
    /// Create both engines from one shared frame geometry.
    pub fn new(config: FrameConfig) -> Result<Self, ConfigError> {
        Ok(Self { rx: Receiver::new(config)?, tx: Transmitter::new(config)? })
    }
    /// Advance both engines one tick.
    pub fn step(
        &mut self,
        line_sample: bool,
        send_request: bool,
        chunk: u16,
        reset: bool,
    ) -> DuplexOutput {
        DuplexOutput {
            rx: self.rx.step(line_sample, reset),
            tx: self.tx.step(send_request, chunk, reset),
        }
    }
    /// Advance both engines one tick with the transmit line fed back into
    /// the receiver.  An undriven line reads idle-high.
    pub fn step_loopback(&mut self, send_request: bool, chunk: u16, reset: bool) -> DuplexOutput {
        let tx = self.tx.step(send_request, chunk, reset);
        let rx = self.rx.step(tx.line.unwrap_or(true), reset);
        DuplexOutput { rx, tx }
    }
}
