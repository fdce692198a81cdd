//! Interrupt related things
//!
//! The handler only latches fault state into [`ERROR_LATCH`]; frames are
//! moved by the periodic task, so the software buffers are never touched
//! from interrupt context.

use imxrt_ral as ral;
use imxrt_ral::interrupt;

use crate::can_error::ErrorLatch;
use crate::message_buffer::{IFLAG_RX_FIFO_OVERFLOW, IFLAG_RX_FIFO_WARNING, TX_MAILBOX_INDEX};

pub(crate) static ERROR_LATCH: ErrorLatch = ErrorLatch::new();

#[cortex_m_rt::interrupt]
fn CAN3() {
    let can3 = unsafe { ral::can3::CAN3::steal() };

    let (bus_off, error) = ral::read_reg!(ral::can3, can3, ESR1, BOFFINT, ERRINT);
    if bus_off == 0b1 {
        ERROR_LATCH.latch_bus_off();
    }
    if bus_off == 0b1 || error == 0b1 {
        ral::write_reg!(ral::can3, can3, ESR1, BOFFINT: bus_off, ERRINT: error);
    }

    let iflag = ral::read_reg!(ral::can3, can3, IFLAG1);
    if iflag & IFLAG_RX_FIFO_OVERFLOW != 0 {
        ERROR_LATCH.record_overflow();
    }

    // Never acknowledge "frames available" here, that would discard a frame
    let handled = iflag & (IFLAG_RX_FIFO_OVERFLOW | IFLAG_RX_FIFO_WARNING | (1 << TX_MAILBOX_INDEX));
    if handled != 0 {
        ral::write_reg!(ral::can3, can3, IFLAG1, handled);
    }
}
