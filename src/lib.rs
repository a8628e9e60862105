//! Crate softuart
//!
//! Tick-driven software model of an asynchronous serial line: a receiver
//! that decodes a timed bit stream into words and a transmitter that
//! encodes words into a timed bit stream.

pub mod uart;
pub mod utils;
