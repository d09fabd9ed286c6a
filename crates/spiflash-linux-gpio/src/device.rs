//! Linux GPIO SPI bitbanging bus
//!
//! This module provides the `LinuxGpioSpi` struct that implements the
//! [`SpiBus`] trait using Linux's GPIO character device interface
//! (gpiocdev). Bytes are shifted out in SPI mode 0, MSB first, by toggling
//! SCK and MOSI and sampling MISO.
//!
//! HOLD# and WP#, when wired to GPIOs, are driven high for the lifetime of
//! the bus so the chip never pauses or write-protects.

use crate::error::{LinuxGpioError, Result};

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use spiflash_core::programmer::bitbang::{self, BitbangSpiMaster};
use spiflash_core::programmer::SpiBus;

/// GPIO line indices
#[derive(Debug, Clone, Copy)]
enum Line {
    Cs = 0,
    Sck = 1,
    Mosi = 2,
    Miso = 3,
}

/// Number of signal lines toggled during transfers
const SIGNAL_LINES: usize = 4;

/// Default half-period delay in nanoseconds (for ~100 kHz SPI clock)
const DEFAULT_HALF_PERIOD_NS: u64 = 5000;

/// Configuration for opening a Linux GPIO SPI bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxGpioSpiConfig {
    /// GPIO chip device path (e.g. "/dev/gpiochip0")
    pub device: String,
    /// CS (chip select) GPIO line offset
    pub cs: Offset,
    /// SCK (clock) GPIO line offset
    pub sck: Offset,
    /// MOSI GPIO line offset
    pub mosi: Offset,
    /// MISO GPIO line offset
    pub miso: Offset,
    /// HOLD# line, held high if present
    pub hold: Option<Offset>,
    /// WP# line, held high if present
    pub wp: Option<Offset>,
    /// Half-period delay in nanoseconds
    pub half_period_ns: u64,
    /// Ignore clock rate requests from the driver
    pub fixed_speed: bool,
}

impl Default for LinuxGpioSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            cs: 0,
            sck: 0,
            mosi: 0,
            miso: 0,
            hold: None,
            wp: None,
            half_period_ns: DEFAULT_HALF_PERIOD_NS,
            fixed_speed: false,
        }
    }
}

/// Half-period delay for a clock rate
fn half_period_for(hz: u32) -> Option<u64> {
    // half_period = 1_000_000_000 / (2 * frequency) in nanoseconds
    (hz > 0).then(|| 500_000_000 / u64::from(hz))
}

impl LinuxGpioSpiConfig {
    /// Create a new configuration with the given device path and required pins
    pub fn new(
        device: impl Into<String>,
        cs: Offset,
        sck: Offset,
        mosi: Offset,
        miso: Offset,
    ) -> Self {
        Self {
            device: device.into(),
            cs,
            sck,
            mosi,
            miso,
            ..Default::default()
        }
    }

    /// Hold HOLD# and WP# high on the given lines
    pub fn with_hold_wp(mut self, hold: Option<Offset>, wp: Option<Offset>) -> Self {
        self.hold = hold;
        self.wp = wp;
        self
    }

    /// Pin the SPI speed in Hz (approximate, via half-period calculation)
    ///
    /// A pinned speed is not changed by the driver's clock requests.
    pub fn with_speed_hz(mut self, hz: u32) -> Self {
        if let Some(ns) = half_period_for(hz) {
            self.half_period_ns = ns;
            self.fixed_speed = true;
        }
        self
    }

    /// Every line this configuration claims
    fn lines(&self) -> impl Iterator<Item = Offset> + '_ {
        [self.cs, self.sck, self.mosi, self.miso]
            .into_iter()
            .chain(self.hold)
            .chain(self.wp)
    }

    fn validate(&self) -> Result<()> {
        if self.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }
        let mut seen = Vec::new();
        for line in self.lines() {
            if seen.contains(&line) {
                return Err(LinuxGpioError::DuplicateLine(line));
            }
            seen.push(line);
        }
        Ok(())
    }
}

/// Linux GPIO SPI bus using bitbanging
///
/// This struct implements [`BitbangSpiMaster`] for the raw line operations
/// and [`SpiBus`] on top of it, so it plugs straight into
/// [`BusMaster`](spiflash_core::programmer::BusMaster).
pub struct LinuxGpioSpi {
    /// GPIO line request handle
    request: Request,
    /// GPIO line offsets indexed by Line enum
    offsets: [Offset; SIGNAL_LINES],
    /// Half-period delay in nanoseconds
    half_period_ns: u64,
    fixed_speed: bool,
}

impl LinuxGpioSpi {
    /// Open a Linux GPIO SPI bus with the given configuration
    pub fn open(config: &LinuxGpioSpiConfig) -> Result<Self> {
        config.validate()?;

        log::debug!("linux_gpio: Opening device {}", config.device);

        let mut offsets = [0u32; SIGNAL_LINES];
        offsets[Line::Cs as usize] = config.cs;
        offsets[Line::Sck as usize] = config.sck;
        offsets[Line::Mosi as usize] = config.mosi;
        offsets[Line::Miso as usize] = config.miso;

        // Initial state: CS=1 (high/inactive), SCK=0 (low), MOSI=0, MISO=input
        let mut req_config = Config::default();
        req_config.with_line(config.cs).as_output(Value::Active);
        req_config.with_line(config.sck).as_output(Value::Inactive);
        req_config.with_line(config.mosi).as_output(Value::Inactive);
        req_config.with_line(config.miso).as_input();
        for line in config.hold.iter().chain(config.wp.iter()) {
            req_config.with_line(*line).as_output(Value::Active);
        }

        let request = Request::from_config(req_config)
            .on_chip(&config.device)
            .with_consumer("spiflash")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                device: config.device.clone(),
                source,
            })?;

        log::info!(
            "linux_gpio: Opened {} (cs={}, sck={}, mosi={}, miso={}, hold={:?}, wp={:?})",
            config.device,
            config.cs,
            config.sck,
            config.mosi,
            config.miso,
            config.hold,
            config.wp
        );

        Ok(Self {
            request,
            offsets,
            half_period_ns: config.half_period_ns,
            fixed_speed: config.fixed_speed,
        })
    }

    /// Current half-period delay in nanoseconds
    pub fn half_period_ns(&self) -> u64 {
        self.half_period_ns
    }

    fn drive(&self, line: Line, high: bool) {
        let value = if high { Value::Active } else { Value::Inactive };
        if let Err(e) = self.request.set_value(self.offsets[line as usize], value) {
            log::error!("Failed to set {:?}: {}", line, e);
        }
    }
}

impl BitbangSpiMaster for LinuxGpioSpi {
    fn set_cs(&mut self, active: bool) {
        // CS is active low
        self.drive(Line::Cs, !active);
    }

    fn set_sck(&mut self, high: bool) {
        self.drive(Line::Sck, high);
    }

    fn set_mosi(&mut self, high: bool) {
        self.drive(Line::Mosi, high);
    }

    fn get_miso(&self) -> bool {
        match self.request.value(self.offsets[Line::Miso as usize]) {
            Ok(Value::Active) => true,
            Ok(Value::Inactive) => false,
            Err(e) => {
                // Reads as an idle (pulled up) line
                log::error!("Failed to get MISO: {}", e);
                true
            }
        }
    }

    fn half_period_delay(&self) {
        if self.half_period_ns > 0 {
            std::thread::sleep(std::time::Duration::from_nanos(self.half_period_ns));
        }
    }
}

impl SpiBus for LinuxGpioSpi {
    fn set_cs(&mut self, active: bool) {
        if !active {
            bitbang::single::idle_clock(self);
        }
        BitbangSpiMaster::set_cs(self, active);
        self.half_period_delay();
    }

    fn transfer_byte(&mut self, out: u8) -> u8 {
        bitbang::single::transfer_byte(self, out)
    }

    fn set_frequency(&mut self, hz: u32) {
        if self.fixed_speed {
            log::debug!("linux_gpio: keeping pinned clock, ignoring {} Hz", hz);
            return;
        }
        if let Some(ns) = half_period_for(hz) {
            log::debug!("linux_gpio: clock {} Hz, half period {} ns", hz, ns);
            self.half_period_ns = ns;
        }
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(us)));
    }
}

fn parse_line(name: &'static str, value: &str) -> Result<Offset> {
    value
        .parse()
        .map_err(|_| LinuxGpioError::InvalidLineNumber {
            name,
            value: value.to_string(),
        })
}

/// Parse programmer options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/gpiochipN` - GPIO chip device path (required, or use gpiochip)
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `cs=N` - CS (chip select) GPIO line offset (required)
/// - `sck=N` - SCK (clock) GPIO line offset (required)
/// - `mosi=N` - MOSI GPIO line offset (required)
/// - `miso=N` - MISO GPIO line offset (required)
/// - `hold=N` - HOLD# GPIO line offset, held high (optional)
/// - `wp=N` - WP# GPIO line offset, held high (optional)
/// - `spispeed=N` - pin the SPI speed in kHz (optional, default follows the driver)
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxGpioSpiConfig> {
    let mut config = LinuxGpioSpiConfig::default();
    let mut cs = None;
    let mut sck = None;
    let mut mosi = None;
    let mut miso = None;
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        match *key {
            "dev" => config.device = value.to_string(),
            "gpiochip" => {
                gpiochip = Some(value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("gpiochip={}", value))
                })?);
            }
            "cs" => cs = Some(parse_line("cs", value)?),
            "sck" => sck = Some(parse_line("sck", value)?),
            "mosi" => mosi = Some(parse_line("mosi", value)?),
            "miso" => miso = Some(parse_line("miso", value)?),
            "hold" => config.hold = Some(parse_line("hold", value)?),
            "wp" => config.wp = Some(parse_line("wp", value)?),
            "spispeed" => {
                let speed_khz: u32 = value
                    .parse()
                    .ok()
                    .filter(|&khz| khz > 0)
                    .ok_or_else(|| {
                        LinuxGpioError::InvalidParameter(format!("spispeed={}", value))
                    })?;
                config = config.with_speed_hz(speed_khz.saturating_mul(1000));
            }
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
            }
        }
    }

    // Handle dev vs gpiochip
    match (config.device.is_empty(), gpiochip) {
        (true, Some(n)) => config.device = format!("/dev/gpiochip{}", n),
        (true, None) => return Err(LinuxGpioError::NoDevice),
        (false, Some(_)) => return Err(LinuxGpioError::ConflictingDevice),
        (false, None) => {}
    }

    config.cs = cs.ok_or(LinuxGpioError::MissingParameter("cs"))?;
    config.sck = sck.ok_or(LinuxGpioError::MissingParameter("sck"))?;
    config.mosi = mosi.ok_or(LinuxGpioError::MissingParameter("mosi"))?;
    config.miso = miso.ok_or(LinuxGpioError::MissingParameter("miso"))?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINS: [(&str, &str); 4] = [("cs", "25"), ("sck", "11"), ("mosi", "10"), ("miso", "9")];

    fn with_pins<'a>(extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        PINS.iter().copied().chain(extra.iter().copied()).collect()
    }

    #[test]
    fn test_parse_basic() {
        let config = parse_options(&with_pins(&[("dev", "/dev/gpiochip0")])).unwrap();
        assert_eq!(
            config,
            LinuxGpioSpiConfig::new("/dev/gpiochip0", 25, 11, 10, 9)
        );
        assert!(!config.fixed_speed);
    }

    #[test]
    fn test_parse_gpiochip_hold_wp() {
        let config =
            parse_options(&with_pins(&[("gpiochip", "1"), ("hold", "22"), ("wp", "23")])).unwrap();
        assert_eq!(config.device, "/dev/gpiochip1");
        assert_eq!(config.hold, Some(22));
        assert_eq!(config.wp, Some(23));
    }

    #[test]
    fn test_parse_speed_pins_clock() {
        let config =
            parse_options(&with_pins(&[("dev", "/dev/gpiochip0"), ("spispeed", "1000")])).unwrap();
        assert_eq!(config.half_period_ns, 500);
        assert!(config.fixed_speed);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_options(&PINS),
            Err(LinuxGpioError::NoDevice)
        ));
        assert!(matches!(
            parse_options(&with_pins(&[("dev", "/dev/gpiochip0"), ("gpiochip", "0")])),
            Err(LinuxGpioError::ConflictingDevice)
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/gpiochip0"), ("cs", "1")]),
            Err(LinuxGpioError::MissingParameter("sck"))
        ));
        assert!(matches!(
            parse_options(&with_pins(&[("dev", "/dev/gpiochip0"), ("wp", "x")])),
            Err(LinuxGpioError::InvalidLineNumber { name: "wp", .. })
        ));
        assert!(matches!(
            parse_options(&with_pins(&[("dev", "/dev/gpiochip0"), ("hold", "25")])),
            Err(LinuxGpioError::DuplicateLine(25))
        ));
    }

    #[test]
    fn test_half_period() {
        assert_eq!(half_period_for(2_500_000), Some(200));
        assert_eq!(half_period_for(0), None);
    }
}
