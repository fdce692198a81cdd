//! Runs the CAN periodic task on a Teensy 4.1: publishes a status frame
//! every 100 ms and logs whatever passes the acceptance filters.

#![no_std]
#![no_main]

extern crate panic_halt;

use cortex_m_rt::entry;
use imxrt_ral as ral;
use log::info;
use teensy4_bsp as bsp;

use telematics_can::config::{Config, RX_PERIOD_MS, TX_PERIOD_MS};
use telematics_can::{
    ids, CanDriver, CanFrame, FlexCan3, FlexCan3Builder, PeriodicTask, SharedDriver,
};

static CAN3: SharedDriver<FlexCan3> = SharedDriver::new();

#[entry]
fn main() -> ! {
    let _p = bsp::Peripherals::take().unwrap();
    let core_peripherals = cortex_m::Peripherals::take().unwrap();
    let mut systick = bsp::SysTick::new(core_peripherals.SYST);

    bsp::usb::init(&systick, bsp::usb::LoggingConfig::default()).unwrap();

    systick.delay(2000);

    info!("Telematics CAN - periodic task");

    let can3 = ral::can3::CAN3::take().unwrap();
    // The BSP already owns these; the driver only touches CAN related bits
    let ccm = unsafe { ral::ccm::CCM::steal() };
    let iomuxc = unsafe { ral::iomuxc::IOMUXC::steal() };

    let controller = FlexCan3Builder::take().unwrap().build(can3, ccm, iomuxc);
    let driver = CanDriver::new(controller, Config::default());

    cortex_m::interrupt::free(|cs| CAN3.install(cs, driver));

    let mut task = PeriodicTask::new();
    let mut counter = 0u32;

    loop {
        counter = counter.wrapping_add(1);

        cortex_m::interrupt::free(|cs| {
            CAN3.with(cs, |can| {
                task.run_once(can);

                if counter % 100 == 0 {
                    let status = counter.to_le_bytes();
                    if let Some(frame) = CanFrame::new(ids::TCU_STATUS, &status) {
                        if can.enqueue_transmit(&frame).is_err() {
                            info!("tx fifo full");
                        }
                    }
                }

                if counter % RX_PERIOD_MS == 0 {
                    while let Ok(frame) = can.dequeue_receive() {
                        info!("RX {:#x} {:?}", frame.identifier(), frame.data());
                    }
                }
            });
        });

        systick.delay(TX_PERIOD_MS);
    }
}
