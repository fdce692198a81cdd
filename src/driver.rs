//! Buffered CAN driver
//!
//! Application code talks to the two software buffers; the periodic task
//! moves frames between the buffers and the controller. Nothing here waits
//! on hardware: every call returns straight away with its outcome.

use log::{debug, info, trace, warn};

use crate::can_error::{ErrorFlags, InitError, RxTxError};
use crate::config::{Config, RX_RING_CAPACITY, TX_FIFO_CAPACITY};
use crate::controller::CanController;
use crate::fifo::FrameRing;
use crate::frame::CanFrame;

pub struct CanDriver<C, const TX: usize = TX_FIFO_CAPACITY, const RX: usize = RX_RING_CAPACITY> {
    controller: C,
    config: Config,
    tx: FrameRing<TX>,
    rx: FrameRing<RX>,
    initialized: bool,
}

impl<C: CanController, const TX: usize, const RX: usize> CanDriver<C, TX, RX> {
    pub fn new(controller: C, config: Config) -> Self {
        Self {
            controller,
            config,
            tx: FrameRing::new(),
            rx: FrameRing::new(),
            initialized: false,
        }
    }

    /// Initializes the controller. Queued frames in both buffers survive,
    /// so this doubles as the recovery path after a bus fault.
    pub fn init(&mut self) -> Result<(), InitError> {
        self.initialized = false;

        match self.controller.initialize(&self.config) {
            Ok(()) => {
                info!(
                    "CAN {:?} up at {} bit/s, {} filters",
                    self.config.module,
                    self.config.baud_rate.to_bps(),
                    self.config.filters.len()
                );
                self.initialized = true;
                Ok(())
            }
            Err(err) => {
                warn!("CAN init failed: {}", err.get_error_message());
                Err(err)
            }
        }
    }

    pub fn shutdown(&mut self) {
        info!(
            "CAN {:?} shutting down with {} tx / {} rx frames buffered",
            self.config.module,
            self.tx.len(),
            self.rx.len()
        );
        self.controller.shutdown();
        self.initialized = false;
    }

    /// Queues `frame` for transmission. `BufferFull` leaves the FIFO untouched.
    pub fn enqueue_transmit(&mut self, frame: &CanFrame) -> Result<(), RxTxError> {
        if !self.tx.push(frame) {
            debug!("tx fifo full, dropping {:#x}", frame.identifier());
            return Err(RxTxError::BufferFull);
        }

        Ok(())
    }

    /// Hands the oldest queued frame to the controller. The frame is only
    /// released once the controller accepts it; a busy mailbox leaves it
    /// queued for the next call.
    pub fn drain_transmit(&mut self) -> Result<(), RxTxError> {
        let frame = self.tx.peek().ok_or(RxTxError::BufferEmpty)?;

        self.controller.transmit_one(&frame)?;
        self.tx.advance_read();

        if cfg!(feature = "debuginfo") {
            trace!(
                "Sent {}-byte frame w/ ID {:#x}, {} still queued",
                frame.dlc(),
                frame.identifier(),
                self.tx.len()
            );
        }

        Ok(())
    }

    /// Moves one frame from the controller into the receive ring.
    /// `BufferFull` if the ring has no room (the controller is not asked),
    /// `BufferEmpty` if the controller had nothing.
    pub fn fill_receive(&mut self) -> Result<(), RxTxError> {
        if self.rx.is_full() {
            return Err(RxTxError::BufferFull);
        }

        let frame = self.controller.receive_one().ok_or(RxTxError::BufferEmpty)?;

        if let Some(slot) = self.rx.slot_for_write() {
            slot.copy_from(&frame);
            self.rx.commit_write();
        }

        if cfg!(feature = "debuginfo") {
            trace!("Received {}-byte frame w/ ID {:#x}", frame.dlc(), frame.identifier());
        }

        Ok(())
    }

    /// Up to `config.rx_burst` calls to [`CanDriver::fill_receive`],
    /// stopping at the first one that does not succeed. Returns the number
    /// of frames moved.
    pub fn fill_receive_burst(&mut self) -> usize {
        let mut filled = 0;

        while filled < self.config.rx_burst {
            match self.fill_receive() {
                Ok(()) => filled += 1,
                Err(RxTxError::BufferFull) => {
                    debug!("rx ring full, leaving frames in hardware");
                    break;
                }
                Err(_) => break,
            }
        }

        filled
    }

    /// Oldest received frame
    pub fn dequeue_receive(&mut self) -> Result<CanFrame, RxTxError> {
        self.rx.pop().ok_or(RxTxError::BufferEmpty)
    }

    pub fn error_flags(&mut self) -> ErrorFlags {
        self.controller.error_flags()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn tx_pending(&self) -> usize {
        self.tx.len()
    }

    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }
}
