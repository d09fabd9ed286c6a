//! Bitbang SPI helpers
//!
//! This module provides the trait and helper functions for implementing a
//! [`SpiBus`](super::SpiBus) by toggling GPIO lines in software. Only
//! single-wire SPI mode 0 is supported: MOSI changes while SCK is low and
//! MISO is sampled on the rising edge, MSB first.

/// Trait for low-level bitbang SPI operations
pub trait BitbangSpiMaster {
    /// Set chip select (CS is active low, so `active=true` means CS=0)
    fn set_cs(&mut self, active: bool);

    /// Set clock line value
    fn set_sck(&mut self, high: bool);

    /// Set MOSI line value
    fn set_mosi(&mut self, high: bool);

    /// Get MISO line value
    fn get_miso(&self) -> bool;

    /// Delay for half a clock period
    fn half_period_delay(&self);

    /// Optional: Set SCK and MOSI atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `set_mosi`.
    fn set_sck_set_mosi(&mut self, sck: bool, mosi: bool) {
        self.set_sck(sck);
        self.set_mosi(mosi);
    }

    /// Optional: Set SCK and get MISO atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `get_miso`.
    fn set_sck_get_miso(&mut self, sck: bool) -> bool {
        self.set_sck(sck);
        self.get_miso()
    }
}

/// Bitbang helper functions for single-wire I/O
pub mod single {
    use super::BitbangSpiMaster;

    /// Exchange one byte full-duplex (MSB first)
    pub fn transfer_byte<M: BitbangSpiMaster + ?Sized>(master: &mut M, out: u8) -> u8 {
        let mut byte = 0u8;
        for i in (0..8).rev() {
            let bit = (out >> i) & 1 != 0;
            master.set_sck_set_mosi(false, bit);
            master.half_period_delay();
            byte <<= 1;
            if master.set_sck_get_miso(true) {
                byte |= 1;
            }
            master.half_period_delay();
        }
        byte
    }

    /// Return SCK to idle low before deselecting
    pub fn idle_clock<M: BitbangSpiMaster + ?Sized>(master: &mut M) {
        master.set_sck(false);
        master.half_period_delay();
    }
}
