//! Driver lifecycle
//!
//! ```text
//!   Init ──initialized──▶ ActiveOperation ──bus fault──▶ ErrorHandling
//!    ▲ │                        ▲                              │
//!    └─┘ retry                  └──────── recovered ───────────┘
//!
//!   any state ──shutdown requested──▶ Shutdown (absorbing)
//! ```

use crate::can_error::ErrorFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Init,
    ActiveOperation,
    ErrorHandling,
    Shutdown,
}

impl Default for DriverState {
    fn default() -> Self {
        DriverState::Init
    }
}

/// What the task observed during one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// The controller is initialized and in normal operation
    pub initialized: bool,
    pub flags: ErrorFlags,
    pub shutdown_requested: bool,
}

/// Decides whether a set of error flags counts as a bus fault
pub trait BusFaultPolicy {
    fn is_bus_fault(&self, flags: &ErrorFlags) -> bool;
}

/// Faults only on bus-off
#[derive(Debug, Clone, Copy, Default)]
pub struct BusOffDetector;

impl BusFaultPolicy for BusOffDetector {
    fn is_bus_fault(&self, flags: &ErrorFlags) -> bool {
        flags.bus_off
    }
}

/// Faults as soon as the node leaves error-active
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorPassiveDetector;

impl BusFaultPolicy for ErrorPassiveDetector {
    fn is_bus_fault(&self, flags: &ErrorFlags) -> bool {
        !flags.is_error_active()
    }
}

impl<F: Fn(&ErrorFlags) -> bool> BusFaultPolicy for F {
    fn is_bus_fault(&self, flags: &ErrorFlags) -> bool {
        self(flags)
    }
}

/// What to do while in `ErrorHandling`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Re-run controller initialization every `interval_ticks` task cycles
    PeriodicReinit { interval_ticks: u32 },
    /// Stay faulted until shutdown
    Never,
}

impl RecoveryPolicy {
    /// Whether a re-init attempt is due after `ticks` cycles in ErrorHandling
    /// without one
    pub fn reinit_due(&self, ticks: u32) -> bool {
        match self {
            RecoveryPolicy::PeriodicReinit { interval_ticks } => ticks >= (*interval_ticks).max(1),
            RecoveryPolicy::Never => false,
        }
    }
}

pub fn transition<P: BusFaultPolicy + ?Sized>(
    state: DriverState,
    snapshot: &StatusSnapshot,
    policy: &P,
) -> DriverState {
    if snapshot.shutdown_requested {
        return DriverState::Shutdown;
    }

    match state {
        DriverState::Init if snapshot.initialized => DriverState::ActiveOperation,
        DriverState::Init => DriverState::Init,
        DriverState::ActiveOperation if policy.is_bus_fault(&snapshot.flags) => {
            DriverState::ErrorHandling
        }
        DriverState::ActiveOperation => DriverState::ActiveOperation,
        DriverState::ErrorHandling
            if snapshot.initialized && !policy.is_bus_fault(&snapshot.flags) =>
        {
            DriverState::ActiveOperation
        }
        DriverState::ErrorHandling => DriverState::ErrorHandling,
        DriverState::Shutdown => DriverState::Shutdown,
    }
}
