//! Transmit mailbox, RX FIFO and its acceptance filter table

use imxrt_ral as ral;

use crate::can_error::{InitError, RxTxError};
use crate::filter::AcceptanceRule;
use crate::flexcan::FlexCan3;
use crate::frame::CanFrame;
use crate::message_buffer::ram::*;
use crate::message_buffer::*;

/// Written into unused filter elements: an extended remote frame with
/// every identifier bit set, which nothing on the bus sends.
const REJECT_ALL_ELEMENT: u32 = 0xFFFF_FFFF;

impl FlexCan3 {
    pub(crate) fn configure_tx_mailbox(&mut self) {
        let mb_data_offset = self.tx_mailbox_offset();

        self.write_iflag_bit(TX_MAILBOX_INDEX);

        let mut cs_reg = CSRegisterBitfield::new();
        cs_reg.write_field(CSField::CODE, CS_CODE_TX_INACTIVE);
        write_cs_reg(mb_data_offset, cs_reg);
        write_id_reg(mb_data_offset, IDRegisterBitfield::new());
        write_data_words(mb_data_offset, [0, 0]);
    }

    /// Stages `frame` in the TX mailbox. Does not wait for the frame to
    /// leave; completion shows up as the mailbox IFLAG bit.
    pub(crate) fn transmit(&mut self, frame: &CanFrame) -> Result<(), RxTxError> {
        let mb_data_offset = self.tx_mailbox_offset();

        // Ensure the mailbox can transfer
        let mut cs_reg = read_cs_reg(mb_data_offset);
        if cs_reg.read_field(CSField::CODE) == CS_CODE_TX_DATA_OR_REMOTE {
            return Err(RxTxError::HardwareNotReady);
        }

        self.write_iflag_bit(TX_MAILBOX_INDEX);

        // "Inactive" message buffer
        cs_reg.write_field(CSField::CODE, CS_CODE_TX_INACTIVE);
        write_cs_reg(mb_data_offset, cs_reg);

        let (cs_reg, id_reg, words) = encode_tx(frame);
        write_id_reg(mb_data_offset, id_reg);
        write_data_words(mb_data_offset, words);

        // Writing the CODE field last is what requests the transmission
        write_cs_reg(mb_data_offset, cs_reg);

        Ok(())
    }

    /// Pops the RX FIFO output, or `None` when the FIFO is empty
    pub(crate) fn receive(&mut self) -> Option<CanFrame> {
        let iflag = ral::read_reg!(ral::can3, self.instance, IFLAG1);
        if iflag & IFLAG_RX_FIFO_AVAILABLE == 0 {
            return None;
        }

        let cs_reg = read_cs_reg(RX_FIFO_OUTPUT_OFFSET);
        let id_reg = read_id_reg(RX_FIFO_OUTPUT_OFFSET);
        let words = read_data_words(RX_FIFO_OUTPUT_OFFSET);

        // Quirk: Read the free-running timer to unlock the message buffer
        ral::read_reg!(ral::can3, self.instance, TIMER);

        // Acknowledging "frames available" moves the FIFO to its next entry
        ral::write_reg!(ral::can3, self.instance, IFLAG1, IFLAG_RX_FIFO_AVAILABLE);

        let frame = decode_rx(cs_reg, id_reg, words);

        if cfg!(feature = "debuginfo") {
            let hit = ral::read_reg!(ral::can3, self.instance, RXFIR, IDHIT);
            log::trace!(
                "RX FIFO frame w/ ID {:#x} via filter #{}; CS: {:#010x}, ID: {:#010x}",
                frame.identifier(),
                hit,
                cs_reg.bits(),
                id_reg.bits(),
            );
        }

        Some(frame)
    }

    /// Writes the rules into the filter table in order, each with its own
    /// mask. Elements past the end of `rules` are set to reject. Must be
    /// called while frozen.
    pub(crate) fn write_filter_table(&mut self, rules: &[AcceptanceRule]) -> Result<(), InitError> {
        if rules.len() > RX_FIFO_FILTER_ELEMENTS {
            return Err(InitError::TooManyFilters);
        }

        for index in 0..RX_FIFO_FILTER_ELEMENTS {
            let (element, mask) = match rules.get(index) {
                Some(rule) => (filter_element(rule), filter_mask(rule)),
                None => (REJECT_ALL_ELEMENT, 0xFFFF_FFFF),
            };

            write_filter_element(index, element);
            self.write_rximr(index, mask);
        }

        // Elements beyond the individual masks fall back to the global one
        ral::write_reg!(ral::can3, self.instance, RXFGMASK, 0xFFFF_FFFF);

        Ok(())
    }

    fn write_rximr(&mut self, n: usize, mask: u32) {
        match n {
            0 => ral::write_reg!(ral::can3, self.instance, RXIMR0, mask),
            1 => ral::write_reg!(ral::can3, self.instance, RXIMR1, mask),
            2 => ral::write_reg!(ral::can3, self.instance, RXIMR2, mask),
            3 => ral::write_reg!(ral::can3, self.instance, RXIMR3, mask),
            4 => ral::write_reg!(ral::can3, self.instance, RXIMR4, mask),
            5 => ral::write_reg!(ral::can3, self.instance, RXIMR5, mask),
            6 => ral::write_reg!(ral::can3, self.instance, RXIMR6, mask),
            7 => ral::write_reg!(ral::can3, self.instance, RXIMR7, mask),
            _ => (),
        }
    }

    fn write_iflag_bit(&self, index: u32) {
        if index < 32 {
            ral::write_reg!(ral::can3, self.instance, IFLAG1, 1 << index);
        } else if index < 64 {
            ral::write_reg!(ral::can3, self.instance, IFLAG2, 1 << (index - 32));
        }
    }
}
