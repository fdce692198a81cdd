//! Capability interface between the buffering layer and a CAN controller
//!
//! Implementations are single-frame only and hold no message state of
//! their own beyond what the hardware keeps. They are not reentrant;
//! callers that share one across contexts must serialize access.

use crate::can_error::{ErrorFlags, InitError, RxTxError};
use crate::config::{BaudRate, Config};
use crate::filter::AcceptanceRule;
use crate::frame::CanFrame;

pub trait CanController {
    /// Brings the controller from reset to normal operation: clocks, mode
    /// sequence, bit timing, acceptance filters and interrupt sources.
    /// On error the controller must not be left in normal mode.
    fn initialize(&mut self, config: &Config) -> Result<(), InitError>;

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<(), InitError>;

    fn configure_acceptance_filters(&mut self, rules: &[AcceptanceRule]) -> Result<(), InitError>;

    /// Stages `frame` for transmission without waiting for completion.
    /// `HardwareNotReady` if a previous request is still pending.
    fn transmit_one(&mut self, frame: &CanFrame) -> Result<(), RxTxError>;

    /// Takes the oldest frame out of the hardware receive FIFO
    fn receive_one(&mut self) -> Option<CanFrame>;

    fn error_flags(&mut self) -> ErrorFlags;

    /// Takes the controller off the bus
    fn shutdown(&mut self) {}
}
