//! CAN3 of the i.MX RT1062 as a [`CanController`]
//!
//! The controller runs in classic mode with the legacy RX FIFO: accepted
//! frames queue up in a six-deep hardware FIFO behind the acceptance filter
//! table, and a single dedicated mailbox is used for transmission.

use core::sync::atomic::{AtomicBool, Ordering};

use imxrt_ral as ral;
use log::{debug, warn};

use crate::can_error::{ErrorFlags, InitError, RxTxError};
use crate::config::{BaudRate, Clock, Config, Module, DEFAULT_TIMING, DEFAULT_WAIT_LIMIT};
use crate::controller::CanController;
use crate::filter::AcceptanceRule;
use crate::frame::CanFrame;
use crate::interrupt::ERROR_LATCH;

static TAKEN: AtomicBool = AtomicBool::new(false);

pub struct FlexCan3 {
    pub(crate) instance: ral::can3::Instance,
    pub(crate) ccm: ral::ccm::Instance,
    pub(crate) iomuxc: ral::iomuxc::Instance,
    pub(crate) clock: Clock,
    pub(crate) wait_limit: u32,
}

pub struct FlexCan3Builder {}

impl FlexCan3Builder {
    /// Hands out the one and only builder
    pub fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self {})
        }
    }

    /// The controller stays in reset until [`CanController::initialize`] is called
    pub fn build(
        self,
        can3: ral::can3::Instance,
        ccm: ral::ccm::Instance,
        iomuxc: ral::iomuxc::Instance,
    ) -> FlexCan3 {
        FlexCan3 {
            instance: can3,
            ccm,
            iomuxc,
            clock: Clock::Clock24Mhz,
            wait_limit: DEFAULT_WAIT_LIMIT,
        }
    }
}

impl CanController for FlexCan3 {
    fn initialize(&mut self, config: &Config) -> Result<(), InitError> {
        if config.module != Module::Can3 {
            return Err(InitError::UnsupportedModule);
        }

        if config.fd_enable {
            return Err(InitError::FdNotSupported);
        }

        self.clock = config.clock_speed;
        self.wait_limit = config.wait_limit;

        self.init_clocks();
        self.init_pins();
        self.enable(true)?;
        self.reset()?;
        self.configure_classic_mode();

        // Any failure from here on leaves the controller frozen and off the bus
        self.set_baud_rate(config.baud_rate)?;
        self.configure_acceptance_filters(config.filters)?;
        self.configure_tx_mailbox();
        self.enable_interrupts();

        self.exit_freeze()
    }

    fn set_baud_rate(&mut self, rate: BaudRate) -> Result<(), InitError> {
        let was_frozen = self.is_frozen();
        self.enter_freeze()?;

        match rate.timing(self.clock) {
            Some(timing) => {
                ral::write_reg!(ral::can3, self.instance, CBT, timing.to_cbt());
            }
            None => {
                warn!("no timing for {} bit/s at {} Hz", rate.to_bps(), self.clock.to_hz());
                ral::write_reg!(ral::can3, self.instance, CBT, DEFAULT_TIMING.to_cbt());
                return Err(InitError::UnsupportedBaudrate);
            }
        }

        if !was_frozen {
            self.exit_freeze()?;
        }

        Ok(())
    }

    fn configure_acceptance_filters(&mut self, rules: &[AcceptanceRule]) -> Result<(), InitError> {
        let was_frozen = self.is_frozen();
        self.enter_freeze()?;

        self.write_filter_table(rules)?;
        debug!("installed {} acceptance rules", rules.len());

        // The table is write-protected again once freeze mode is left
        if !was_frozen {
            self.exit_freeze()?;
        }

        Ok(())
    }

    fn transmit_one(&mut self, frame: &CanFrame) -> Result<(), RxTxError> {
        self.transmit(frame)
    }

    fn receive_one(&mut self) -> Option<CanFrame> {
        self.receive()
    }

    fn error_flags(&mut self) -> ErrorFlags {
        let fltconf = ral::read_reg!(ral::can3, self.instance, ESR1, FLTCONF);
        let (tx_errors, rx_errors) = ral::read_reg!(ral::can3, self.instance, ECR, TXERRCNT, RXERRCNT);

        let mut flags = ErrorFlags {
            bus_off: fltconf >= 0b10,
            error_passive: fltconf == 0b01,
            tx_error_count: tx_errors as u8,
            rx_error_count: rx_errors as u8,
            rx_overflows: 0,
        };

        ERROR_LATCH.drain_into(&mut flags);
        flags
    }

    fn shutdown(&mut self) {
        self.disable_interrupts();

        if self.enter_freeze().is_err() {
            warn!("CAN3 did not freeze before shutdown");
        }

        if self.enable(false).is_err() {
            warn!("CAN3 did not enter low power mode");
        }
    }
}
