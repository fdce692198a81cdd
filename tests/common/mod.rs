#![allow(dead_code)]

use std::collections::VecDeque;

use telematics_can::can_error::{ErrorFlags, InitError, RxTxError};
use telematics_can::config::{BaudRate, Config};
use telematics_can::controller::CanController;
use telematics_can::filter::{accepts, AcceptanceRule};
use telematics_can::CanFrame;

/// Controller double that records every call and serves frames from a queue
#[derive(Default)]
pub struct MockController {
    pub transmitted: Vec<CanFrame>,
    pub transmit_calls: usize,
    pub receive_calls: usize,
    /// Frames "on the bus"; only those passing the installed filters are received
    pub inbound: VecDeque<CanFrame>,
    pub filters: Vec<AcceptanceRule>,
    pub busy_for: usize,
    pub init_failures_left: usize,
    pub init_calls: usize,
    pub shutdown_calls: usize,
    pub flags: ErrorFlags,
    pub baud_rate: Option<BaudRate>,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_inbound(&mut self, frame: CanFrame) {
        self.inbound.push_back(frame);
    }
}

impl CanController for MockController {
    fn initialize(&mut self, config: &Config) -> Result<(), InitError> {
        self.init_calls += 1;

        if self.init_failures_left > 0 {
            self.init_failures_left -= 1;
            return Err(InitError::ClockNotStable);
        }

        self.set_baud_rate(config.baud_rate)?;
        self.configure_acceptance_filters(config.filters)?;
        self.flags = ErrorFlags::default();
        Ok(())
    }

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<(), InitError> {
        if let BaudRate::Mbps2 = rate {
            return Err(InitError::UnsupportedBaudrate);
        }

        self.baud_rate = Some(rate);
        Ok(())
    }

    fn configure_acceptance_filters(&mut self, rules: &[AcceptanceRule]) -> Result<(), InitError> {
        self.filters = rules.to_vec();
        Ok(())
    }

    fn transmit_one(&mut self, frame: &CanFrame) -> Result<(), RxTxError> {
        self.transmit_calls += 1;

        if self.busy_for > 0 {
            self.busy_for -= 1;
            return Err(RxTxError::HardwareNotReady);
        }

        self.transmitted.push(*frame);
        Ok(())
    }

    fn receive_one(&mut self) -> Option<CanFrame> {
        self.receive_calls += 1;

        while let Some(frame) = self.inbound.pop_front() {
            if accepts(&self.filters, frame.identifier(), frame.is_extended_id()) {
                return Some(frame);
            }
        }

        None
    }

    fn error_flags(&mut self) -> ErrorFlags {
        self.flags
    }

    fn shutdown(&mut self) {
        self.shutdown_calls += 1;
    }
}

pub fn frame(id: u32) -> CanFrame {
    CanFrame::new(id, &[id as u8, (id >> 8) as u8, 0xA5, 0x5A, 1, 2, 3, 4]).unwrap()
}

/// Config whose filters let every standard identifier through
pub fn open_config() -> Config {
    static ACCEPT_ALL: &[AcceptanceRule] = &[AcceptanceRule::masked(0, 0)];

    Config {
        filters: ACCEPT_ALL,
        ..Config::default()
    }
}
