//! Errors and status flags of the CAN driver

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use embedded_hal::can::{Error, ErrorKind};

/// Reasons the controller could not be brought into normal operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    UnsupportedBaudrate,
    UnsupportedModule,
    FdNotSupported,
    ClockNotStable,
    ModeTransitionTimeout,
    TooManyFilters,
}

impl InitError {
    pub fn get_error_message(&self) -> &'static str {
        match self {
            InitError::UnsupportedBaudrate => "Baudrate has no timing entry for this clock, check the baudrate table",
            InitError::UnsupportedModule => "This controller does not drive the requested CAN module",
            InitError::FdNotSupported => "CAN FD cannot be combined with the legacy RX FIFO",
            InitError::ClockNotStable => "CAN clock did not report stable within the wait limit",
            InitError::ModeTransitionTimeout => "Controller did not acknowledge a mode change within the wait limit",
            InitError::TooManyFilters => "Acceptance filter table is larger than the hardware filter table",
        }
    }
}

impl Error for InitError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Outcome of a single buffer or mailbox exchange. None of these are
/// fatal; callers are expected to see them during normal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxTxError {
    /// No room left; the frame was not stored
    BufferFull,
    /// Nothing to hand out
    BufferEmpty,
    /// The transmit mailbox still holds a pending request
    HardwareNotReady,
}

impl RxTxError {
    pub fn get_error_message(&self) -> &'static str {
        match self {
            RxTxError::BufferFull => "Buffer is full, frame was dropped",
            RxTxError::BufferEmpty => "Buffer is empty",
            RxTxError::HardwareNotReady => "Transmit mailbox busy, frame stays queued",
        }
    }
}

impl Error for RxTxError {
    fn kind(&self) -> ErrorKind {
        match self {
            RxTxError::BufferFull => ErrorKind::Overrun,
            _ => ErrorKind::Other,
        }
    }
}

/// Snapshot of the controller's fault confinement state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorFlags {
    pub bus_off: bool,
    pub error_passive: bool,
    pub tx_error_count: u8,
    pub rx_error_count: u8,
    /// Frames the hardware receive FIFO dropped since the last read
    pub rx_overflows: u32,
}

impl ErrorFlags {
    pub fn is_error_active(&self) -> bool {
        !self.bus_off && !self.error_passive
    }
}

/// Fault state written from interrupt context and read from the periodic
/// task. Only atomics are shared, so neither side needs a critical section.
pub struct ErrorLatch {
    bus_off: AtomicBool,
    rx_overflows: AtomicU32,
}

impl ErrorLatch {
    pub const fn new() -> Self {
        Self {
            bus_off: AtomicBool::new(false),
            rx_overflows: AtomicU32::new(0),
        }
    }

    pub fn latch_bus_off(&self) {
        self.bus_off.store(true, Ordering::Release);
    }

    pub fn record_overflow(&self) {
        self.rx_overflows.fetch_add(1, Ordering::AcqRel);
    }

    /// Merges the latched state into `flags` and rearms the latch
    pub fn drain_into(&self, flags: &mut ErrorFlags) {
        if self.bus_off.swap(false, Ordering::AcqRel) {
            flags.bus_off = true;
        }

        let seen = self.rx_overflows.swap(0, Ordering::AcqRel);
        flags.rx_overflows = flags.rx_overflows.wrapping_add(seen);
    }
}

impl Default for ErrorLatch {
    fn default() -> Self {
        Self::new()
    }
}
