//! Backend registration and dispatch
//!
//! A backend is anything that provides the byte bus the flash hangs off.
//! Backends are selected with a `name:key=value,...` string and enabled at
//! compile time through cargo features.

use std::path::PathBuf;

use thiserror::Error;

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "Emulated W25Q chip (image=<file>,id=<0xMMDD>,size=<KiB>,busy=<polls>,stuck=<0|1>)",
    });

    #[cfg(feature = "linux-gpio")]
    backends.push(BackendInfo {
        name: "linux_gpio",
        aliases: &["linux-gpio", "gpio"],
        description: "Linux GPIO bitbang (dev=/dev/gpiochipN,cs=,sck=,mosi=,miso=[,hold=,wp=,spispeed=<kHz>])",
    });

    backends
}

/// Comma-separated list of backend names for help text
pub fn backend_names_short() -> String {
    available_backends()
        .iter()
        .map(|b| b.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn find_backend(name: &str) -> Option<BackendInfo> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
}

/// Errors raised while selecting and opening a backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// No compiled-in backend has this name
    #[error("Unknown backend '{0}' [available: {names}]", names = backend_names_short())]
    Unknown(String),

    /// Malformed `key=value` list
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParameter(String),

    /// Dummy backend failure
    #[cfg(feature = "dummy")]
    #[error(transparent)]
    Dummy(#[from] spiflash_dummy::DummyError),

    /// Linux GPIO backend failure
    #[cfg(feature = "linux-gpio")]
    #[error(transparent)]
    LinuxGpio(#[from] spiflash_linux_gpio::LinuxGpioError),
}

/// Parsed backend string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendParams {
    /// Backend name
    pub name: String,
    /// Options in the order given
    pub params: Vec<(String, String)>,
}

impl BackendParams {
    /// Options as borrowed pairs, the form backend crates accept
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a backend string into name and options
///
/// # Example
/// ```ignore
/// let params = parse_backend_params("dummy:id=0xEF16")?;
/// assert_eq!(params.name, "dummy");
/// ```
pub fn parse_backend_params(s: &str) -> Result<BackendParams, BackendError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    for opt in opts_str.split(',').filter(|opt| !opt.is_empty()) {
        match opt.split_once('=') {
            Some((key, value)) => params.push((key.to_string(), value.to_string())),
            None => return Err(BackendError::InvalidParameter(opt.to_string())),
        }
    }

    Ok(BackendParams {
        name: name.to_string(),
        params,
    })
}

/// An opened backend, ready to be wrapped in a block device
pub enum Backend {
    /// Emulated chip, saved back to `image` when done
    #[cfg(feature = "dummy")]
    Dummy {
        flash: spiflash_dummy::DummyFlash,
        image: Option<PathBuf>,
    },
    /// GPIO bitbang bus
    #[cfg(feature = "linux-gpio")]
    LinuxGpio(spiflash_linux_gpio::LinuxGpioSpi),
}

/// Open the backend named by `spec`
pub fn open_backend(spec: &str) -> Result<Backend, BackendError> {
    let params = parse_backend_params(spec)?;
    let info = find_backend(&params.name)
        .ok_or_else(|| BackendError::Unknown(params.name.clone()))?;
    log::debug!("Opening backend {}", info.name);

    #[allow(unused_variables)]
    let options = params.pairs();
    match info.name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let opts = spiflash_dummy::parse_options(&options)?;
            let flash = opts.open()?;
            Ok(Backend::Dummy {
                flash,
                image: opts.image,
            })
        }
        #[cfg(feature = "linux-gpio")]
        "linux_gpio" => Ok(Backend::LinuxGpio(spiflash_linux_gpio::open_linux_gpio(
            &options,
        )?)),
        _ => Err(BackendError::Unknown(params.name)),
    }
}
