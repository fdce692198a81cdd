//! Identifiers the telematics unit sends and listens for
//!
//! [`ACCEPTANCE_FILTERS`] is the only place that decides which external
//! frames reach the receive ring.

use crate::filter::AcceptanceRule;

pub const ENGINE_STATUS: u32 = 0x0C0;
pub const VEHICLE_SPEED: u32 = 0x0D0;
pub const FUEL_LEVEL: u32 = 0x0E0;
pub const BATTERY_STATUS: u32 = 0x120;
/// Body controller broadcasts, 0x180..=0x18F
pub const BODY_STATUS_BASE: u32 = 0x180;
/// Commands addressed to the telematics unit
pub const TCU_COMMAND: u32 = 0x300;
/// OBD physical request range, 0x7E0..=0x7E7
pub const DIAG_REQUEST_BASE: u32 = 0x7E0;

pub const TCU_STATUS: u32 = 0x400;
pub const GPS_POSITION: u32 = 0x410;
pub const GSM_STATUS: u32 = 0x420;
pub const DIAG_RESPONSE_BASE: u32 = 0x7E8;

pub static ACCEPTANCE_FILTERS: &[AcceptanceRule] = &[
    AcceptanceRule::exact(ENGINE_STATUS),
    AcceptanceRule::exact(VEHICLE_SPEED),
    AcceptanceRule::exact(FUEL_LEVEL),
    AcceptanceRule::exact(BATTERY_STATUS),
    AcceptanceRule::masked(BODY_STATUS_BASE, 0x7F0),
    AcceptanceRule::exact(TCU_COMMAND),
    AcceptanceRule::masked(DIAG_REQUEST_BASE, 0x7F8),
];
