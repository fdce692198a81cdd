//! Message buffer RAM layout of the FlexCAN controller
//!
//! Classic CAN only: every message buffer is 16 bytes (CS word, ID word,
//! two data words). With the legacy RX FIFO enabled and RFFN = 0, MB0 is
//! the FIFO output, MB6..MB7 hold the 8-element ID filter table and MB8 is
//! the first buffer free for transmission.

use crate::filter::AcceptanceRule;
use crate::frame::CanFrame;

pub const MESSAGE_BUFFER_BASE_ADDR: u32 = 0x401D_8000 + 0x80;
pub const MESSAGE_BUFFER_SIZE: u32 = 16;

/// RX FIFO output, read through the MB0 window
pub const RX_FIFO_OUTPUT_OFFSET: u32 = 0;
/// Start of the RX FIFO ID filter table (MB6, module offset 0xE0)
pub const RX_FIFO_FILTER_OFFSET: u32 = 0x60;
/// Filter elements available with CTRL2[RFFN] = 0
pub const RX_FIFO_FILTER_ELEMENTS: usize = 8;
/// Dedicated transmit mailbox
pub const TX_MAILBOX_INDEX: u32 = 8;

pub const CS_CODE_TX_INACTIVE: u32 = 0x8;
pub const CS_CODE_TX_DATA_OR_REMOTE: u32 = 0xC;

/// IFLAG1 bits with a special meaning while the RX FIFO is enabled
pub const IFLAG_RX_FIFO_AVAILABLE: u32 = 1 << 5;
pub const IFLAG_RX_FIFO_WARNING: u32 = 1 << 6;
pub const IFLAG_RX_FIFO_OVERFLOW: u32 = 1 << 7;

pub fn mailbox_offset(mb_index: u32) -> u32 {
    mb_index * MESSAGE_BUFFER_SIZE
}

/// Data words are stored with byte 0 in the most significant byte, the
/// opposite of a [`CanFrame`] window.
pub fn window_to_word(window: u32) -> u32 {
    window.swap_bytes()
}

pub fn word_to_window(word: u32) -> u32 {
    word.swap_bytes()
}

/// Encodes a rule as a format A RX FIFO filter element: RTR in bit 31,
/// IDE in bit 30, the identifier left-aligned in bits 29..1.
pub fn filter_element(rule: &AcceptanceRule) -> u32 {
    if rule.extended {
        (1 << 30) | ((rule.id & 0x1FFF_FFFF) << 1)
    } else {
        (rule.id & 0x7FF) << 19
    }
}

/// Individual mask for a filter element (RXIMRn). RTR and IDE are always
/// compared, so remote frames and the other id format never match.
pub fn filter_mask(rule: &AcceptanceRule) -> u32 {
    let id_mask = if rule.extended {
        (rule.mask & 0x1FFF_FFFF) << 1
    } else {
        (rule.mask & 0x7FF) << 19
    };

    (1 << 31) | (1 << 30) | id_mask
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CSField {
    CODE,
    SRR,
    IDE,
    RTR,
    DLC,
    TIMESTAMP,
}

impl CSField {
    fn mask(&self) -> u32 {
        match self {
            CSField::CODE => 0xF00_0000,
            CSField::SRR => 0x40_0000,
            CSField::IDE => 0x20_0000,
            CSField::RTR => 0x10_0000,
            CSField::DLC => 0xF_0000,
            CSField::TIMESTAMP => 0xFFFF,
        }
    }

    fn shift(&self) -> u32 {
        match self {
            CSField::CODE => 24,
            CSField::SRR => 22,
            CSField::IDE => 21,
            CSField::RTR => 20,
            CSField::DLC => 16,
            CSField::TIMESTAMP => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CSRegisterBitfield {
    val: u32,
}

impl CSRegisterBitfield {
    pub fn new() -> Self {
        Self { val: 0 }
    }

    pub fn from_bits(val: u32) -> Self {
        Self { val }
    }

    pub fn bits(&self) -> u32 {
        self.val
    }

    pub fn write_field(&mut self, field: CSField, value: u32) {
        self.val = (self.val & (!field.mask())) | ((value << field.shift()) & field.mask());
    }

    pub fn read_field(&self, field: CSField) -> u32 {
        (self.val & field.mask()) >> field.shift()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum IDField {
    PRIO,
    ID_STD,
    ID_EXT,
}

impl IDField {
    fn mask(&self) -> u32 {
        match self {
            IDField::PRIO => 0xE000_0000,
            IDField::ID_STD => 0x1FFC_0000,
            IDField::ID_EXT => 0x1FFF_FFFF,
        }
    }

    fn shift(&self) -> u32 {
        match self {
            IDField::PRIO => 29,
            IDField::ID_STD => 18,
            IDField::ID_EXT => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IDRegisterBitfield {
    val: u32,
}

impl IDRegisterBitfield {
    pub fn new() -> Self {
        Self { val: 0 }
    }

    pub fn from_bits(val: u32) -> Self {
        Self { val }
    }

    pub fn bits(&self) -> u32 {
        self.val
    }

    pub fn write_field(&mut self, field: IDField, value: u32) {
        self.val = (self.val & (!field.mask())) | ((value << field.shift()) & field.mask());
    }

    pub fn read_field(&self, field: IDField) -> u32 {
        (self.val & field.mask()) >> field.shift()
    }
}

/// Register image of a frame staged for transmission: CS, ID, data words
pub fn encode_tx(frame: &CanFrame) -> (CSRegisterBitfield, IDRegisterBitfield, [u32; 2]) {
    let mut id_reg = IDRegisterBitfield::new();
    let mut cs_reg = CSRegisterBitfield::new();

    cs_reg.write_field(CSField::CODE, CS_CODE_TX_DATA_OR_REMOTE);
    cs_reg.write_field(CSField::DLC, frame.dlc() as u32);

    if frame.is_extended_id() {
        id_reg.write_field(IDField::ID_EXT, frame.identifier());
        cs_reg.write_field(CSField::SRR, 0b1);
        cs_reg.write_field(CSField::IDE, 0b1);
    } else {
        id_reg.write_field(IDField::ID_STD, frame.identifier());
    }

    let windows = frame.to_windows();

    (cs_reg, id_reg, [window_to_word(windows[0]), window_to_word(windows[1])])
}

/// Frame held in a message buffer whose registers read `cs`, `id` and `words`
pub fn decode_rx(
    cs_reg: CSRegisterBitfield,
    id_reg: IDRegisterBitfield,
    words: [u32; 2],
) -> CanFrame {
    let extended = cs_reg.read_field(CSField::IDE) == 0b1;
    let id = if extended {
        id_reg.read_field(IDField::ID_EXT)
    } else {
        id_reg.read_field(IDField::ID_STD)
    };

    CanFrame::from_windows(
        id,
        extended,
        cs_reg.read_field(CSField::DLC) as u8,
        [word_to_window(words[0]), word_to_window(words[1])],
    )
}

#[cfg(feature = "imxrt1062")]
pub(crate) mod ram {
    //! Volatile access to the message buffer RAM

    use super::*;
    use core::ptr;

    fn addr(mb_data_offset: u32, word: u32) -> *mut u32 {
        (MESSAGE_BUFFER_BASE_ADDR + mb_data_offset + word * 4) as *mut u32
    }

    pub fn read_cs_reg(mb_data_offset: u32) -> CSRegisterBitfield {
        unsafe { CSRegisterBitfield::from_bits(ptr::read_volatile(addr(mb_data_offset, 0))) }
    }

    pub fn write_cs_reg(mb_data_offset: u32, cs_reg: CSRegisterBitfield) {
        unsafe { ptr::write_volatile(addr(mb_data_offset, 0), cs_reg.bits()) }
    }

    pub fn read_id_reg(mb_data_offset: u32) -> IDRegisterBitfield {
        unsafe { IDRegisterBitfield::from_bits(ptr::read_volatile(addr(mb_data_offset, 1))) }
    }

    pub fn write_id_reg(mb_data_offset: u32, id_reg: IDRegisterBitfield) {
        unsafe { ptr::write_volatile(addr(mb_data_offset, 1), id_reg.bits()) }
    }

    pub fn read_data_words(mb_data_offset: u32) -> [u32; 2] {
        unsafe {
            [
                ptr::read_volatile(addr(mb_data_offset, 2)),
                ptr::read_volatile(addr(mb_data_offset, 3)),
            ]
        }
    }

    pub fn write_data_words(mb_data_offset: u32, words: [u32; 2]) {
        unsafe {
            ptr::write_volatile(addr(mb_data_offset, 2), words[0]);
            ptr::write_volatile(addr(mb_data_offset, 3), words[1]);
        }
    }

    pub fn write_filter_element(index: usize, element: u32) {
        unsafe { ptr::write_volatile(addr(RX_FIFO_FILTER_OFFSET, index as u32), element) }
    }
}
