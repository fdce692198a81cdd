//! Does all initialization oriented things

use imxrt_ral as ral;

use crate::can_error::InitError;
use crate::flexcan::FlexCan3;
use crate::interrupt::ERROR_LATCH;
use crate::message_buffer::{mailbox_offset, IFLAG_RX_FIFO_OVERFLOW, TX_MAILBOX_INDEX};
use crate::util::wait_until;

impl FlexCan3 {
    pub(crate) fn init_clocks(&mut self) {
        // Select and divide the CAN root clock
        ral::modify_reg!(ral::ccm, self.ccm, CSCMR2, CAN_CLK_SEL: self.clock.to_clk_sel(), CAN_CLK_PODF: self.clock.to_clk_podf());

        // Due to a hardware bug, the LPUART clock must be on for CAN3 to work
        ral::modify_reg!(ral::ccm, self.ccm, CCGR0, CG6: 0b11);

        // Enable clocks
        ral::modify_reg!(ral::ccm, self.ccm, CCGR7, CG4: 0b11, CG3: 0b11);
    }

    pub(crate) fn init_pins(&mut self) {
        // Set transfer pin
        ral::modify_reg!(ral::iomuxc, self.iomuxc, SW_MUX_CTL_PAD_GPIO_EMC_36, SION: 0b1, MUX_MODE: 0b1001);
        ral::modify_reg!(ral::iomuxc, self.iomuxc, SW_PAD_CTL_PAD_GPIO_EMC_36, |_| 0x10B0);

        // Set receive pin
        ral::modify_reg!(ral::iomuxc, self.iomuxc, CANFD_IPP_IND_CANRX_SELECT_INPUT, DAISY: 0b00);
        ral::modify_reg!(ral::iomuxc, self.iomuxc, SW_MUX_CTL_PAD_GPIO_EMC_37, SION: 0b1, MUX_MODE: 0b1001);
        ral::modify_reg!(ral::iomuxc, self.iomuxc, SW_PAD_CTL_PAD_GPIO_EMC_37, |_| 0x10B0);
    }

    /// Leaves (or enters) low power mode. The module only acknowledges
    /// once its clock is running, so a timeout means the clock never came up.
    pub(crate) fn enable(&mut self, state: bool) -> Result<(), InitError> {
        ral::modify_reg!(ral::can3, self.instance, MCR, MDIS: if state { 0b0 } else { 0b1 });

        let target = if state { 0b0 } else { 0b1 };
        let instance = &self.instance;
        if wait_until(self.wait_limit, || ral::read_reg!(ral::can3, instance, MCR, LPMACK) == target) {
            Ok(())
        } else {
            Err(InitError::ClockNotStable)
        }
    }

    pub(crate) fn is_frozen(&self) -> bool {
        ral::read_reg!(ral::can3, self.instance, MCR, FRZACK) == 0b1
    }

    pub(crate) fn enter_freeze(&mut self) -> Result<(), InitError> {
        ral::modify_reg!(ral::can3, self.instance, MCR, FRZ: 0b1, HALT: 0b1);
        self.wait_freeze_ack(0b1)
    }

    pub(crate) fn exit_freeze(&mut self) -> Result<(), InitError> {
        ral::modify_reg!(ral::can3, self.instance, MCR, HALT: 0b0);
        self.wait_freeze_ack(0b0)
    }

    fn wait_freeze_ack(&self, target: u32) -> Result<(), InitError> {
        let instance = &self.instance;
        if wait_until(self.wait_limit, || ral::read_reg!(ral::can3, instance, MCR, FRZACK) == target) {
            Ok(())
        } else {
            Err(InitError::ModeTransitionTimeout)
        }
    }

    /// Soft reset. The module comes out of it in freeze mode.
    pub(crate) fn reset(&mut self) -> Result<(), InitError> {
        let limit = self.wait_limit;
        let instance = &self.instance;

        ral::modify_reg!(ral::can3, instance, MCR, DOZE: 0b0);

        // Wait for exit from low power mode
        if !wait_until(limit, || ral::read_reg!(ral::can3, instance, MCR, LPMACK) == 0b0) {
            return Err(InitError::ClockNotStable);
        }

        ral::modify_reg!(ral::can3, instance, MCR, SOFTRST: 0b1);
        if !wait_until(limit, || ral::read_reg!(ral::can3, instance, MCR, SOFTRST) == 0b0) {
            return Err(InitError::ModeTransitionTimeout);
        }

        // Make sure FREEZE mode is enabled
        if !wait_until(limit, || ral::read_reg!(ral::can3, instance, MCR, FRZACK) == 0b1) {
            return Err(InitError::ModeTransitionTimeout);
        }

        ral::modify_reg!(ral::can3, instance, MCR, WRNEN: 0b1, SUPV: 0b0, LPRIOEN: 0b0);
        ral::write_reg!(ral::can3, instance, CTRL1, 0);
        ral::write_reg!(ral::can3, instance, CTRL2, RRS: 0b1, EACEN: 0b0, TASD: 0x16);

        ral::write_reg!(ral::can3, instance, IMASK1, 0);
        ral::write_reg!(ral::can3, instance, IMASK2, 0);

        // Flags are write-1-to-clear
        ral::write_reg!(ral::can3, instance, IFLAG1, 0xFFFF_FFFF);
        ral::write_reg!(ral::can3, instance, IFLAG2, 0xFFFF_FFFF);

        // Counters restart at zero, so nothing latched before is still true
        let mut stale = Default::default();
        ERROR_LATCH.drain_into(&mut stale);

        Ok(())
    }

    /// Classic CAN with the legacy RX FIFO (8 filter elements) in front of
    /// the dedicated transmit mailbox. Must be called while frozen.
    pub(crate) fn configure_classic_mode(&mut self) {
        // Set:         Last message buffer in use (MAXMB), the TX mailbox
        // Enable:      Legacy RX FIFO (RFEN), ID acceptance format A (IDAM)
        // Enable:      Individual RX masking (IRMQ), one mask per filter element
        // Disable:     Self-reception (SRXDIS)
        // Disable:     CAN FD (FDEN)
        // Enable:      Transmission abort (AEN)
        ral::modify_reg!(ral::can3, self.instance, MCR,
            MAXMB: TX_MAILBOX_INDEX, RFEN: 0b1, IDAM: 0b00,
            IRMQ: 0b1, SRXDIS: 0b1, FDEN: 0b0, AEN: 0b1);

        // Disable loop back (LPB) & listen only (LOM) & timer sync (TSYN)
        // Disable automatic bus-off recovery (BOFFREC), the periodic task re-initializes instead
        ral::modify_reg!(ral::can3, self.instance, CTRL1, LPB: 0b0, LOM: 0b0, TSYN: 0b0, BOFFREC: 0b1);

        // 8 filter elements (RFFN), RX FIFO matched before mailboxes (MRP)
        ral::modify_reg!(ral::can3, self.instance, CTRL2, RFFN: 0b0000, MRP: 0b0);
    }

    /// Transmit mailbox interrupt, RX FIFO overflow ("message lost"),
    /// bus-off and bus error interrupts.
    pub(crate) fn enable_interrupts(&mut self) {
        ral::write_reg!(
            ral::can3,
            self.instance,
            IMASK1,
            IFLAG_RX_FIFO_OVERFLOW | (1 << TX_MAILBOX_INDEX)
        );
        ral::modify_reg!(ral::can3, self.instance, CTRL1, BOFFMSK: 0b1, ERRMSK: 0b1);

        unsafe {
            cortex_m::peripheral::NVIC::unmask(ral::interrupt::CAN3);
        }
    }

    pub(crate) fn disable_interrupts(&mut self) {
        cortex_m::peripheral::NVIC::mask(ral::interrupt::CAN3);

        ral::write_reg!(ral::can3, self.instance, IMASK1, 0);
        ral::modify_reg!(ral::can3, self.instance, CTRL1, BOFFMSK: 0b0, ERRMSK: 0b0);
    }

    pub(crate) fn tx_mailbox_offset(&self) -> u32 {
        mailbox_offset(TX_MAILBOX_INDEX)
    }
}
