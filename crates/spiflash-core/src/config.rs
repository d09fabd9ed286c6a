//! Driver configuration
//!
//! Bus clock and busy-poll budgets. Poll budgets follow the typical
//! program/erase times of W25Q parts with generous headroom.

/// Default serial clock: 2.5 MHz
pub const DEFAULT_BUS_HZ: u32 = 2_500_000;

/// How often and for how long to poll the busy bit after an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PollTiming {
    /// Delay between status register polls, in microseconds
    pub poll_delay_us: u32,
    /// Give up with [`Error::Timeout`](crate::Error::Timeout) after this long
    pub timeout_us: u32,
}

impl PollTiming {
    /// Create a poll timing
    pub const fn new(poll_delay_us: u32, timeout_us: u32) -> Self {
        Self {
            poll_delay_us,
            timeout_us,
        }
    }

    /// Number of status polls this timing allows (at least one)
    pub const fn max_polls(&self) -> u32 {
        let polls = if self.poll_delay_us > 0 {
            self.timeout_us / self.poll_delay_us
        } else {
            self.timeout_us
        };
        if polls == 0 {
            1
        } else {
            polls
        }
    }
}

/// Configuration for the flash driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct SpiFlashConfig {
    /// Serial clock rate applied at initialization
    pub bus_hz: u32,
    /// Page program: typical 0.7-3ms
    pub page_program: PollTiming,
    /// 4KB sector erase: typical 45-400ms
    pub erase_4k: PollTiming,
    /// 32KB and 64KB block erase: typical 120-2000ms
    pub erase_block: PollTiming,
    /// Chip erase: typical 3-100s depending on size
    pub erase_chip: PollTiming,
}

impl Default for SpiFlashConfig {
    fn default() -> Self {
        Self {
            bus_hz: DEFAULT_BUS_HZ,
            page_program: PollTiming::new(10, 10_000),
            erase_4k: PollTiming::new(10_000, 1_000_000),
            erase_block: PollTiming::new(100_000, 4_000_000),
            erase_chip: PollTiming::new(1_000_000, 200_000_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_polls() {
        assert_eq!(PollTiming::new(10, 10_000).max_polls(), 1000);
        assert_eq!(PollTiming::new(0, 50).max_polls(), 50);
        assert_eq!(PollTiming::new(100, 10).max_polls(), 1);
        assert_eq!(PollTiming::new(0, 0).max_polls(), 1);
    }

    #[test]
    fn test_default_clock() {
        assert_eq!(SpiFlashConfig::default().bus_hz, 2_500_000);
    }
}
