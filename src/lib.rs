#![cfg_attr(not(test), no_std)]

pub mod can_error;
pub mod config;
pub mod controller;
pub mod driver;
pub mod fifo;
pub mod filter;
pub mod frame;
pub mod ids;
pub mod state;
pub mod task;
pub(crate) mod util;

#[cfg(feature = "imxrt1062")]
pub mod flexcan;
#[cfg(feature = "imxrt1062")]
mod init;
#[cfg(feature = "imxrt1062")]
mod interrupt;
#[cfg(feature = "imxrt1062")]
mod mailbox;
pub mod message_buffer;

use core::cell::RefCell;
use cortex_m::interrupt::{CriticalSection, Mutex};

pub use can_error::{ErrorFlags, InitError, RxTxError};
pub use config::Config;
pub use controller::CanController;
pub use driver::CanDriver;
pub use frame::CanFrame;
pub use state::DriverState;
pub use task::PeriodicTask;

#[cfg(feature = "imxrt1062")]
pub use flexcan::{FlexCan3, FlexCan3Builder};

/// A driver that can be reached from more than one execution context.
/// Every access happens inside a critical section, which keeps the
/// single-producer/single-consumer discipline of both buffers intact even
/// when application code and the periodic task preempt each other.
///
/// ```ignore
/// static CAN: SharedDriver<FlexCan3> = SharedDriver::new();
///
/// cortex_m::interrupt::free(|cs| CAN.install(cs, driver));
/// cortex_m::interrupt::free(|cs| CAN.with(cs, |can| can.enqueue_transmit(&frame)));
/// ```
pub struct SharedDriver<
    C,
    const TX: usize = { config::TX_FIFO_CAPACITY },
    const RX: usize = { config::RX_RING_CAPACITY },
> {
    inner: Mutex<RefCell<Option<CanDriver<C, TX, RX>>>>,
}

impl<C, const TX: usize, const RX: usize> SharedDriver<C, TX, RX> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }
}

impl<C: CanController, const TX: usize, const RX: usize> SharedDriver<C, TX, RX> {
    /// Stores the driver, handing back any previous one
    pub fn install(
        &self,
        cs: &CriticalSection,
        driver: CanDriver<C, TX, RX>,
    ) -> Option<CanDriver<C, TX, RX>> {
        self.inner.borrow(cs).replace(Some(driver))
    }

    pub fn take(&self, cs: &CriticalSection) -> Option<CanDriver<C, TX, RX>> {
        self.inner.borrow(cs).borrow_mut().take()
    }

    /// Runs `f` on the driver. `None` if nothing is installed.
    pub fn with<R>(
        &self,
        cs: &CriticalSection,
        f: impl FnOnce(&mut CanDriver<C, TX, RX>) -> R,
    ) -> Option<R> {
        self.inner.borrow(cs).borrow_mut().as_mut().map(f)
    }
}
