//! Block translation layer
//!
//! Maps fixed-size logical blocks onto the flash chip. Reads and writes go
//! through a single-sector write-back cache; erase and reprogram of a
//! sector happen only when the cache is evicted or flushed.

mod cache;
mod device;
mod geometry;
mod spi_disk;

pub use cache::{CacheState, SectorCache};
pub use device::{BlockDevice, DiskStatus, Transfer};
pub use geometry::*;
pub use spi_disk::SpiFlashDisk;
