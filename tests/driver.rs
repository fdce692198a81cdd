mod common;

use common::{frame, open_config, MockController};
use telematics_can::config::{Config, RX_RING_CAPACITY, TX_FIFO_CAPACITY};
use telematics_can::{ids, CanDriver, CanFrame, InitError, RxTxError};

fn driver() -> CanDriver<MockController> {
    let mut driver = CanDriver::new(MockController::new(), open_config());
    driver.init().unwrap();
    driver
}

fn small_driver() -> CanDriver<MockController, 4, 4> {
    let mut driver = CanDriver::new(MockController::new(), open_config());
    driver.init().unwrap();
    driver
}

#[test]
fn tx_fifo_holds_capacity_minus_one() {
    let mut driver = driver();

    for id in 0..(TX_FIFO_CAPACITY - 1) as u32 {
        assert_eq!(driver.enqueue_transmit(&frame(id)), Ok(()));
    }

    assert_eq!(driver.enqueue_transmit(&frame(0x7FF)), Err(RxTxError::BufferFull));
    assert_eq!(driver.tx_pending(), TX_FIFO_CAPACITY - 1);
}

#[test]
fn small_fifo_full_then_room_after_drain() {
    let mut driver = small_driver();

    for id in 1..=3 {
        assert_eq!(driver.enqueue_transmit(&frame(id)), Ok(()));
    }
    assert_eq!(driver.enqueue_transmit(&frame(4)), Err(RxTxError::BufferFull));

    assert_eq!(driver.drain_transmit(), Ok(()));
    assert_eq!(driver.enqueue_transmit(&frame(4)), Ok(()));
    assert_eq!(driver.tx_pending(), 3);
}

#[test]
fn draining_empty_fifo_skips_hardware() {
    let mut driver = driver();

    assert_eq!(driver.drain_transmit(), Err(RxTxError::BufferEmpty));
    assert_eq!(driver.controller().transmit_calls, 0);
}

#[test]
fn round_trip_is_byte_identical() {
    let mut driver = driver();
    let sent = CanFrame::new(0x123, &[0xDE, 0xAD, 0xBE, 0xEF, 0x01]).unwrap();

    driver.enqueue_transmit(&sent).unwrap();
    while driver.drain_transmit().is_ok() {}

    let mock = driver.controller();
    assert_eq!(mock.transmit_calls, 1);
    assert_eq!(mock.transmitted.len(), 1);

    let seen = mock.transmitted[0];
    assert_eq!(seen.identifier(), 0x123);
    assert_eq!(seen.dlc(), 5);
    assert_eq!(seen.data(), &[0xDE, 0xAD, 0xBE, 0xEF, 0x01]);
}

#[test]
fn frames_leave_in_enqueue_order() {
    let mut driver = driver();

    for id in [0x100, 0x200, 0x300].iter() {
        let frame = CanFrame::new(*id, &[0x11; 8]).unwrap();
        driver.enqueue_transmit(&frame).unwrap();
    }

    for _ in 0..3 {
        assert_eq!(driver.drain_transmit(), Ok(()));
    }

    let ids: Vec<u32> = driver.controller().transmitted.iter().map(|f| f.identifier()).collect();
    assert_eq!(ids, vec![0x100, 0x200, 0x300]);
    assert!(driver.controller().transmitted.iter().all(|f| f.dlc() == 8));
}

#[test]
fn busy_mailbox_keeps_frame_queued() {
    let mut driver = driver();
    driver.controller_mut().busy_for = 2;
    driver.enqueue_transmit(&frame(0x42)).unwrap();

    assert_eq!(driver.drain_transmit(), Err(RxTxError::HardwareNotReady));
    assert_eq!(driver.controller().transmit_calls, 1);
    assert_eq!(driver.drain_transmit(), Err(RxTxError::HardwareNotReady));
    assert_eq!(driver.tx_pending(), 1);

    assert_eq!(driver.drain_transmit(), Ok(()));
    assert_eq!(driver.controller().transmitted, vec![frame(0x42)]);
    assert_eq!(driver.tx_pending(), 0);
}

#[test]
fn oversized_dlc_is_clamped_on_the_way_out() {
    let mut driver = driver();
    let raw = CanFrame::from_raw(0x321, false, 12, [7; 8]);

    driver.enqueue_transmit(&raw).unwrap();
    driver.drain_transmit().unwrap();

    assert_eq!(driver.controller().transmitted[0].dlc(), 8);
}

#[test]
fn rx_ring_fills_to_capacity_minus_one() {
    let mut driver = driver();

    for id in 0..(RX_RING_CAPACITY as u32 + 10) {
        driver.controller_mut().push_inbound(frame(id));
    }

    let mut filled = 0;
    loop {
        match driver.fill_receive() {
            Ok(()) => filled += 1,
            Err(err) => {
                assert_eq!(err, RxTxError::BufferFull);
                break;
            }
        }
    }

    assert_eq!(filled, RX_RING_CAPACITY - 1);
    assert_eq!(driver.rx_pending(), RX_RING_CAPACITY - 1);

    // A full ring does not pull anything else out of the hardware
    let calls = driver.controller().receive_calls;
    assert_eq!(driver.fill_receive(), Err(RxTxError::BufferFull));
    assert_eq!(driver.controller().receive_calls, calls);
    assert_eq!(driver.controller().inbound.len(), 11);

    // Nothing unread was overwritten
    for id in 0..(RX_RING_CAPACITY as u32 - 1) {
        assert_eq!(driver.dequeue_receive(), Ok(frame(id)));
    }
}

#[test]
fn received_frames_keep_hardware_order() {
    let mut driver = small_driver();

    for id in [0x10, 0x20, 0x30].iter() {
        driver.controller_mut().push_inbound(frame(*id));
    }

    assert_eq!(driver.fill_receive(), Ok(()));
    assert_eq!(driver.dequeue_receive(), Ok(frame(0x10)));
    assert_eq!(driver.fill_receive(), Ok(()));
    assert_eq!(driver.fill_receive(), Ok(()));
    assert_eq!(driver.dequeue_receive(), Ok(frame(0x20)));
    assert_eq!(driver.dequeue_receive(), Ok(frame(0x30)));
    assert_eq!(driver.dequeue_receive(), Err(RxTxError::BufferEmpty));
}

#[test]
fn fill_reports_empty_hardware() {
    let mut driver = driver();

    assert_eq!(driver.fill_receive(), Err(RxTxError::BufferEmpty));
    assert_eq!(driver.rx_pending(), 0);
}

#[test]
fn dequeue_on_empty_ring() {
    let mut driver = driver();

    assert_eq!(driver.dequeue_receive(), Err(RxTxError::BufferEmpty));
    assert_eq!(driver.rx_pending(), 0);
}

#[test]
fn burst_is_bounded_per_cycle() {
    let mut driver = driver();

    for id in 0..20 {
        driver.controller_mut().push_inbound(frame(id));
    }

    assert_eq!(driver.fill_receive_burst(), 8);
    assert_eq!(driver.fill_receive_burst(), 8);
    assert_eq!(driver.fill_receive_burst(), 4);
    assert_eq!(driver.fill_receive_burst(), 0);
    assert_eq!(driver.rx_pending(), 20);
}

#[test]
fn burst_stops_when_ring_is_full() {
    let mut driver = small_driver();

    for id in 0..10 {
        driver.controller_mut().push_inbound(frame(id));
    }

    assert_eq!(driver.fill_receive_burst(), 3);
    assert_eq!(driver.controller().inbound.len(), 7);
}

#[test]
fn compiled_in_filters_decide_what_is_received() {
    let mut driver: CanDriver<MockController> =
        CanDriver::new(MockController::new(), Config::default());
    driver.init().unwrap();

    driver.controller_mut().push_inbound(frame(ids::GPS_POSITION));
    driver.controller_mut().push_inbound(frame(ids::VEHICLE_SPEED));
    driver.controller_mut().push_inbound(frame(0x7E5));
    driver.controller_mut().push_inbound(frame(0x555));

    assert_eq!(driver.fill_receive_burst(), 2);
    assert_eq!(driver.dequeue_receive(), Ok(frame(ids::VEHICLE_SPEED)));
    assert_eq!(driver.dequeue_receive(), Ok(frame(0x7E5)));
}

#[test]
fn failed_init_is_reported() {
    let mut mock = MockController::new();
    mock.init_failures_left = 1;
    let mut driver: CanDriver<MockController> = CanDriver::new(mock, open_config());

    assert_eq!(driver.init(), Err(InitError::ClockNotStable));
    assert!(!driver.is_initialized());

    assert_eq!(driver.init(), Ok(()));
    assert!(driver.is_initialized());
}

#[test]
fn unsupported_baudrate_fails_closed() {
    let config = Config {
        baud_rate: telematics_can::config::BaudRate::Mbps2,
        ..open_config()
    };
    let mut driver: CanDriver<MockController> = CanDriver::new(MockController::new(), config);

    assert_eq!(driver.init(), Err(InitError::UnsupportedBaudrate));
    assert!(!driver.is_initialized());
}

#[test]
fn buffers_survive_reinit() {
    let mut driver = driver();
    driver.enqueue_transmit(&frame(1)).unwrap();

    driver.init().unwrap();

    assert_eq!(driver.tx_pending(), 1);
    assert_eq!(driver.drain_transmit(), Ok(()));
}
