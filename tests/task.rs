mod common;

use common::{frame, open_config, MockController};
use telematics_can::can_error::ErrorFlags;
use telematics_can::config::Config;
use telematics_can::state::{ErrorPassiveDetector, RecoveryPolicy};
use telematics_can::{CanDriver, DriverState, PeriodicTask};

fn driver_with(config: Config) -> CanDriver<MockController> {
    CanDriver::new(MockController::new(), config)
}

fn bus_off() -> ErrorFlags {
    ErrorFlags {
        bus_off: true,
        tx_error_count: 255,
        ..ErrorFlags::default()
    }
}

#[test]
fn init_is_retried_every_tick() {
    let mut driver = driver_with(open_config());
    driver.controller_mut().init_failures_left = 3;
    let mut task = PeriodicTask::new();

    for attempt in 1..=3 {
        assert_eq!(task.run_once(&mut driver), DriverState::Init);
        assert_eq!(task.init_failures(), attempt);
    }

    assert_eq!(task.run_once(&mut driver), DriverState::ActiveOperation);
    assert_eq!(driver.controller().init_calls, 4);
}

#[test]
fn active_cycle_drains_one_and_fills_a_burst() {
    let mut driver = driver_with(open_config());
    let mut task = PeriodicTask::new();
    task.run_once(&mut driver);

    driver.enqueue_transmit(&frame(0x100)).unwrap();
    driver.enqueue_transmit(&frame(0x200)).unwrap();
    for id in 0..10 {
        driver.controller_mut().push_inbound(frame(0x500 + id));
    }

    assert_eq!(task.run_once(&mut driver), DriverState::ActiveOperation);
    assert_eq!(driver.controller().transmitted.len(), 1);
    assert_eq!(driver.rx_pending(), 8);

    task.run_once(&mut driver);
    assert_eq!(driver.controller().transmitted, vec![frame(0x100), frame(0x200)]);
    assert_eq!(driver.rx_pending(), 10);
    assert_eq!(task.ticks_in_state(), 2);
}

#[test]
fn bus_off_is_recovered_by_periodic_reinit() {
    let config = Config {
        recovery: RecoveryPolicy::PeriodicReinit { interval_ticks: 3 },
        ..open_config()
    };
    let mut driver = driver_with(config);
    let mut task = PeriodicTask::new();

    assert_eq!(task.run_once(&mut driver), DriverState::ActiveOperation);

    driver.controller_mut().flags = bus_off();
    assert_eq!(task.run_once(&mut driver), DriverState::ErrorHandling);

    // Frames queued while faulted stay put
    driver.enqueue_transmit(&frame(0x300)).unwrap();
    for _ in 0..3 {
        assert_eq!(task.run_once(&mut driver), DriverState::ErrorHandling);
    }
    assert_eq!(driver.controller().init_calls, 1);
    assert!(driver.controller().transmitted.is_empty());

    assert_eq!(task.run_once(&mut driver), DriverState::ActiveOperation);
    assert_eq!(driver.controller().init_calls, 2);

    task.run_once(&mut driver);
    assert_eq!(driver.controller().transmitted, vec![frame(0x300)]);
}

#[test]
fn no_recovery_without_policy() {
    let config = Config {
        recovery: RecoveryPolicy::Never,
        ..open_config()
    };
    let mut driver = driver_with(config);
    let mut task = PeriodicTask::new();

    task.run_once(&mut driver);
    driver.controller_mut().flags = bus_off();
    task.run_once(&mut driver);

    for _ in 0..500 {
        assert_eq!(task.run_once(&mut driver), DriverState::ErrorHandling);
    }
    assert_eq!(driver.controller().init_calls, 1);
}

#[test]
fn injected_fault_policy() {
    let mut driver = driver_with(open_config());
    let mut task = PeriodicTask::with_policy(ErrorPassiveDetector);
    task.run_once(&mut driver);

    driver.controller_mut().flags.error_passive = true;
    assert_eq!(task.run_once(&mut driver), DriverState::ErrorHandling);

    let mut driver = driver_with(open_config());
    let mut task = PeriodicTask::with_policy(|flags: &ErrorFlags| flags.rx_overflows > 0);
    task.run_once(&mut driver);

    driver.controller_mut().flags.error_passive = true;
    assert_eq!(task.run_once(&mut driver), DriverState::ActiveOperation);

    driver.controller_mut().flags.rx_overflows = 1;
    assert_eq!(task.run_once(&mut driver), DriverState::ErrorHandling);
}

#[test]
fn shutdown_is_final() {
    let mut driver = driver_with(open_config());
    let mut task = PeriodicTask::new();
    task.run_once(&mut driver);

    driver.enqueue_transmit(&frame(0x100)).unwrap();
    task.request_shutdown();

    assert_eq!(task.run_once(&mut driver), DriverState::Shutdown);
    assert_eq!(driver.controller().shutdown_calls, 1);
    assert!(!driver.is_initialized());

    for _ in 0..5 {
        assert_eq!(task.run_once(&mut driver), DriverState::Shutdown);
    }
    assert_eq!(driver.controller().shutdown_calls, 1);
    assert!(driver.controller().transmitted.is_empty());
}

#[test]
fn shutdown_before_init_skips_bring_up() {
    let mut driver = driver_with(open_config());
    let mut task = PeriodicTask::new();
    task.request_shutdown();

    assert_eq!(task.run_once(&mut driver), DriverState::Shutdown);
    assert_eq!(driver.controller().init_calls, 0);
}
