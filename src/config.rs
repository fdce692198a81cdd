//! All configuration related structures and enums

use crate::filter::AcceptanceRule;
use crate::ids::ACCEPTANCE_FILTERS;
use crate::state::RecoveryPolicy;

/// Slots in the software transmit FIFO (one is never used)
pub const TX_FIFO_CAPACITY: usize = 80;
/// Slots in the software receive ring (one is never used)
pub const RX_RING_CAPACITY: usize = 80;
/// Frames pulled from the hardware FIFO per task cycle at most
pub const RX_BURST: usize = 8;

/// Tick of the transmit-oriented task
pub const TX_PERIOD_MS: u32 = 1;
/// Tick of the receive-oriented task
pub const RX_PERIOD_MS: u32 = 10;

/// Spins allowed while waiting for a clock or mode acknowledgement
pub const DEFAULT_WAIT_LIMIT: u32 = 100_000;
/// Ticks between re-init attempts while the bus is faulted
pub const DEFAULT_REINIT_INTERVAL: u32 = 100;

/// Time quanta per bit used by every entry of the baudrate table
pub const TQ_PER_BIT: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    Clock8Mhz,
    Clock16Mhz,
    Clock20Mhz,
    Clock24Mhz,
    Clock30Mhz,
    Clock40Mhz,
    Clock60Mhz,
    Clock80Mhz,
}

impl Clock {
    pub fn to_hz(&self) -> u32 {
        match self {
            Clock::Clock8Mhz => 8_000_000,
            Clock::Clock16Mhz => 16_000_000,
            Clock::Clock20Mhz => 20_000_000,
            Clock::Clock24Mhz => 24_000_000,
            Clock::Clock30Mhz => 30_000_000,
            Clock::Clock40Mhz => 40_000_000,
            Clock::Clock60Mhz => 60_000_000,
            Clock::Clock80Mhz => 80_000_000,
        }
    }

    /// CCM_CSCMR2[CAN_CLK_SEL]: 0 = pll3_sw_clk/8 (60 MHz), 1 = osc (24 MHz), 2 = pll3_sw_clk/6 (80 MHz)
    #[cfg_attr(not(feature = "imxrt1062"), allow(dead_code))]
    pub(crate) fn to_clk_sel(&self) -> u32 {
        match self {
            Clock::Clock8Mhz => 2,
            Clock::Clock16Mhz => 2,
            Clock::Clock20Mhz => 2,
            Clock::Clock24Mhz => 1,
            Clock::Clock30Mhz => 0,
            Clock::Clock40Mhz => 2,
            Clock::Clock60Mhz => 0,
            Clock::Clock80Mhz => 2,
        }
    }

    #[cfg_attr(not(feature = "imxrt1062"), allow(dead_code))]
    pub(crate) fn to_clk_podf(&self) -> u32 {
        match self {
            Clock::Clock8Mhz => 9,
            Clock::Clock16Mhz => 4,
            Clock::Clock20Mhz => 3,
            Clock::Clock24Mhz => 0,
            Clock::Clock30Mhz => 1,
            Clock::Clock40Mhz => 1,
            Clock::Clock60Mhz => 0,
            Clock::Clock80Mhz => 0,
        }
    }
}

/// Nominal bit timing. Every field is given in "real" units (not minus one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    pub prescalar_division: u32,
    pub prop_seg: u8,
    pub phase_seg_1: u8,
    pub phase_seg_2: u8,
    pub jump_width: u8,
}

impl TimingConfig {
    /// Segment split shared by the whole baudrate table: 1 + 9 + 8 + 6 = 24 tq, sample point at 75 %
    pub const fn with_prescaler(prescalar_division: u32) -> Self {
        Self {
            prescalar_division,
            prop_seg: 9,
            phase_seg_1: 8,
            phase_seg_2: 6,
            jump_width: 4,
        }
    }

    pub fn time_quanta(&self) -> u32 {
        1 + self.prop_seg as u32 + self.phase_seg_1 as u32 + self.phase_seg_2 as u32
    }

    pub fn bitrate(&self, clock: Clock) -> u32 {
        clock.to_hz() / (self.prescalar_division.max(1) * self.time_quanta())
    }

    /// Packs the timing into a CAN_CBT value (BTF set, fields minus one)
    pub fn to_cbt(&self) -> u32 {
        let div = self.prescalar_division.max(1).min(1024) - 1;
        let prop_seg = (self.prop_seg.max(1).min(64) - 1) as u32;
        let seg1 = (self.phase_seg_1.max(1).min(32) - 1) as u32;
        let seg2 = (self.phase_seg_2.max(2).min(32) - 1) as u32;
        let rjw = (self.jump_width.max(1).min(32) - 1) as u32;

        (1 << 31) | (div << 21) | (rjw << 16) | (prop_seg << 10) | (seg1 << 5) | seg2
    }
}

/// Written when the requested rate has no table entry. The controller is
/// never released from freeze mode with this value.
pub const DEFAULT_TIMING: TimingConfig = TimingConfig::with_prescaler(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    Kbps125,
    Kbps250,
    Kbps500,
    Mbps1,
    /// Reserved for a data-phase rate; classic CAN cannot run it
    Mbps2,
}

impl BaudRate {
    pub fn to_bps(&self) -> u32 {
        match self {
            BaudRate::Kbps125 => 125_000,
            BaudRate::Kbps250 => 250_000,
            BaudRate::Kbps500 => 500_000,
            BaudRate::Mbps1 => 1_000_000,
            BaudRate::Mbps2 => 2_000_000,
        }
    }

    /// Timing for this rate on `clock`, or `None` if the clock cannot be
    /// divided down to an exact 24 tq bit.
    pub fn timing(&self, clock: Clock) -> Option<TimingConfig> {
        if let BaudRate::Mbps2 = self {
            return None;
        }

        let tq_rate = self.to_bps() * TQ_PER_BIT;
        let hz = clock.to_hz();

        if hz % tq_rate != 0 {
            return None;
        }

        let prescaler = hz / tq_rate;
        if prescaler == 0 || prescaler > 1024 {
            return None;
        }

        Some(TimingConfig::with_prescaler(prescaler))
    }
}

/// Hardware CAN module selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Can1,
    Can2,
    Can3,
}

#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub module: Module,
    pub baud_rate: BaudRate,
    pub fd_enable: bool,
    pub clock_speed: Clock,
    pub filters: &'static [AcceptanceRule],
    pub rx_burst: usize,
    pub wait_limit: u32,
    pub recovery: RecoveryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module: Module::Can3,
            baud_rate: BaudRate::Kbps500,
            fd_enable: false,
            clock_speed: Clock::Clock24Mhz,
            filters: ACCEPTANCE_FILTERS,
            rx_burst: RX_BURST,
            wait_limit: DEFAULT_WAIT_LIMIT,
            recovery: RecoveryPolicy::PeriodicReinit {
                interval_ticks: DEFAULT_REINIT_INTERVAL,
            },
        }
    }
}
