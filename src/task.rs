//! Periodic task driving the state machine
//!
//! [`PeriodicTask::run_once`] is called from the scheduler tick. It does
//! the work of the current state, gathers a [`StatusSnapshot`] and lets
//! [`transition`] pick the next state. It never blocks.

use log::{info, warn};

use crate::controller::CanController;
use crate::driver::CanDriver;
use crate::state::{transition, BusFaultPolicy, BusOffDetector, DriverState, StatusSnapshot};

pub struct PeriodicTask<P = BusOffDetector> {
    state: DriverState,
    policy: P,
    ticks_in_state: u32,
    ticks_since_recovery: u32,
    init_failures: u32,
    shutdown_requested: bool,
}

impl PeriodicTask<BusOffDetector> {
    pub fn new() -> Self {
        Self::with_policy(BusOffDetector)
    }
}

impl Default for PeriodicTask<BusOffDetector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: BusFaultPolicy> PeriodicTask<P> {
    pub fn with_policy(policy: P) -> Self {
        Self {
            state: DriverState::Init,
            policy,
            ticks_in_state: 0,
            ticks_since_recovery: 0,
            init_failures: 0,
            shutdown_requested: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn ticks_in_state(&self) -> u32 {
        self.ticks_in_state
    }

    /// Failed initialization attempts since the task started. Init is
    /// retried every tick without limit.
    pub fn init_failures(&self) -> u32 {
        self.init_failures
    }

    /// Takes effect on the next call to `run_once`
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    pub fn run_once<C: CanController, const TX: usize, const RX: usize>(
        &mut self,
        driver: &mut CanDriver<C, TX, RX>,
    ) -> DriverState {
        let mut snapshot = StatusSnapshot {
            initialized: driver.is_initialized(),
            flags: Default::default(),
            shutdown_requested: self.shutdown_requested,
        };

        match self.state {
            DriverState::Init if !self.shutdown_requested => {
                if driver.init().is_err() {
                    self.init_failures = self.init_failures.saturating_add(1);
                    warn!("CAN init attempt {} failed, retrying next tick", self.init_failures);
                }
                snapshot.initialized = driver.is_initialized();
            }
            DriverState::ActiveOperation if !self.shutdown_requested => {
                // A busy mailbox or an empty FIFO is the normal case here
                let _ = driver.drain_transmit();
                driver.fill_receive_burst();
                snapshot.flags = driver.error_flags();
            }
            DriverState::ErrorHandling if !self.shutdown_requested => {
                if driver.config().recovery.reinit_due(self.ticks_since_recovery) {
                    info!("attempting bus recovery after {} ticks", self.ticks_in_state);
                    self.ticks_since_recovery = 0;
                    let _ = driver.init();
                    snapshot.initialized = driver.is_initialized();
                    snapshot.flags = driver.error_flags();
                } else {
                    // Not recovered until a re-init says so
                    snapshot.initialized = false;
                }
            }
            _ => {}
        }

        let next = transition(self.state, &snapshot, &self.policy);
        self.enter(next, driver);
        self.state
    }

    fn enter<C: CanController, const TX: usize, const RX: usize>(
        &mut self,
        next: DriverState,
        driver: &mut CanDriver<C, TX, RX>,
    ) {
        if next == self.state {
            self.ticks_in_state = self.ticks_in_state.saturating_add(1);
            self.ticks_since_recovery = self.ticks_since_recovery.saturating_add(1);
            return;
        }

        match next {
            DriverState::ErrorHandling => warn!("CAN bus fault, leaving normal operation"),
            DriverState::Shutdown => driver.shutdown(),
            _ => info!("CAN driver {:?} -> {:?}", self.state, next),
        }

        self.state = next;
        self.ticks_in_state = 0;
        self.ticks_since_recovery = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::can_error::{ErrorFlags, InitError, RxTxError};
    use crate::config::{BaudRate, Config};
    use crate::state::RecoveryPolicy;
    use crate::filter::AcceptanceRule;
    use crate::frame::CanFrame;

    /// Controller stuck in bus-off that counts init attempts
    #[derive(Default)]
    struct StuckBusOff {
        init_calls: u32,
        bus_off: bool,
    }

    impl CanController for StuckBusOff {
        fn initialize(&mut self, _config: &Config) -> Result<(), InitError> {
            self.init_calls += 1;
            Ok(())
        }

        fn set_baud_rate(&mut self, _rate: BaudRate) -> Result<(), InitError> {
            Ok(())
        }

        fn configure_acceptance_filters(
            &mut self,
            _rules: &[AcceptanceRule],
        ) -> Result<(), InitError> {
            Ok(())
        }

        fn transmit_one(&mut self, _frame: &CanFrame) -> Result<(), RxTxError> {
            Ok(())
        }

        fn receive_one(&mut self) -> Option<CanFrame> {
            None
        }

        fn error_flags(&mut self) -> ErrorFlags {
            ErrorFlags {
                bus_off: self.bus_off,
                ..ErrorFlags::default()
            }
        }
    }

    #[test]
    fn recovery_keeps_running_after_tick_counter_saturates() {
        let config = Config {
            recovery: RecoveryPolicy::PeriodicReinit { interval_ticks: 100 },
            ..Config::default()
        };
        let mut driver: CanDriver<StuckBusOff> = CanDriver::new(StuckBusOff::default(), config);
        let mut task = PeriodicTask::new();

        task.run_once(&mut driver);
        driver.controller_mut().bus_off = true;
        assert_eq!(task.run_once(&mut driver), DriverState::ErrorHandling);

        task.ticks_in_state = u32::MAX - 1;
        let before = driver.controller().init_calls;
        for _ in 0..1000 {
            assert_eq!(task.run_once(&mut driver), DriverState::ErrorHandling);
        }

        assert_eq!(task.ticks_in_state(), u32::MAX);
        assert_eq!(driver.controller().init_calls - before, 9);
    }
}
