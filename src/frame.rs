//! Classic CAN frame as it travels through the software buffers

use embedded_hal::can::{ExtendedId, Frame, Id, StandardId};

/// Largest data length code of a classic CAN frame
pub const MAX_DLC: u8 = 8;

/// Largest 11-bit identifier
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Largest 29-bit identifier
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Clamps a data length code to the classic range. Values above 8 would
/// index past the payload, so they are treated as 8.
pub fn clamp_dlc(dlc: u8) -> u8 {
    dlc.min(MAX_DLC)
}

fn max_id(extended: bool) -> u32 {
    if extended {
        MAX_EXTENDED_ID
    } else {
        MAX_STANDARD_ID
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CanFrame {
    id: u32,
    extended: bool,
    dlc: u8,
    payload: [u8; 8],
}

impl CanFrame {
    /// Standard (11-bit) data frame. Returns `None` if `id` does not fit in
    /// 11 bits or `data` is longer than 8 bytes.
    pub fn new(id: u32, data: &[u8]) -> Option<Self> {
        Self::with_format(id, false, data)
    }

    /// Extended (29-bit) data frame. Returns `None` if `id` does not fit in
    /// 29 bits or `data` is longer than 8 bytes.
    pub fn new_extended(id: u32, data: &[u8]) -> Option<Self> {
        Self::with_format(id, true, data)
    }

    fn with_format(id: u32, extended: bool, data: &[u8]) -> Option<Self> {
        if id > max_id(extended) || data.len() > MAX_DLC as usize {
            return None;
        }

        let mut payload = [0u8; 8];
        payload[..data.len()].copy_from_slice(data);

        Some(Self {
            id,
            extended,
            dlc: data.len() as u8,
            payload,
        })
    }

    /// Builds a frame from raw register contents, clamping `dlc` to 8 and
    /// masking `id` to the width of its format.
    pub fn from_raw(id: u32, extended: bool, dlc: u8, payload: [u8; 8]) -> Self {
        Self {
            id: id & max_id(extended),
            extended,
            dlc: clamp_dlc(dlc),
            payload,
        }
    }

    /// Inverse of [`CanFrame::to_windows`].
    pub fn from_windows(id: u32, extended: bool, dlc: u8, windows: [u32; 2]) -> Self {
        let lo = windows[0].to_le_bytes();
        let hi = windows[1].to_le_bytes();

        let mut payload = [0u8; 8];
        payload[..4].copy_from_slice(&lo);
        payload[4..].copy_from_slice(&hi);

        Self::from_raw(id, extended, dlc, payload)
    }

    /// Packs the payload into the two 32-bit data windows: bytes 0-3
    /// little-endian in window 0, bytes 4-7 in window 1. Bytes past the
    /// DLC are sent as zero.
    pub fn to_windows(&self) -> [u32; 2] {
        let mut bytes = [0u8; 8];
        bytes[..self.dlc as usize].copy_from_slice(self.data());

        [
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        ]
    }

    pub fn identifier(&self) -> u32 {
        self.id
    }

    pub fn is_extended_id(&self) -> bool {
        self.extended
    }

    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    pub fn data(&self) -> &[u8] {
        &self.payload[..self.dlc as usize]
    }

    /// Copies identifier, format, DLC and the DLC bytes of `other` into
    /// `self`. Payload bytes past the DLC keep whatever was there before.
    pub(crate) fn copy_from(&mut self, other: &CanFrame) {
        let len = clamp_dlc(other.dlc);

        self.id = other.id;
        self.extended = other.extended;
        self.dlc = len;
        self.payload[..len as usize].copy_from_slice(&other.payload[..len as usize]);
    }

    pub(crate) const fn empty() -> Self {
        Self {
            id: 0,
            extended: false,
            dlc: 0,
            payload: [0u8; 8],
        }
    }
}

impl Default for CanFrame {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for CanFrame {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.extended == other.extended
            && self.dlc == other.dlc
            && self.data() == other.data()
    }
}

impl Eq for CanFrame {}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) => CanFrame::new(id.as_raw() as u32, data),
            Id::Extended(id) => CanFrame::new_extended(id.as_raw(), data),
        }
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        // Remote frames never leave this driver
        None
    }

    fn is_extended(&self) -> bool {
        self.extended
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        // Identifiers are range checked on construction
        if self.extended {
            ExtendedId::new(self.id)
                .map(Id::Extended)
                .unwrap_or(Id::Extended(ExtendedId::MAX))
        } else {
            StandardId::new(self.id as u16)
                .map(Id::Standard)
                .unwrap_or(Id::Standard(StandardId::MAX))
        }
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        CanFrame::data(self)
    }
}
