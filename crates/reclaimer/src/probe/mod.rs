#![forbid(unsafe_code)]

mod statvfs;

pub use statvfs::{StatvfsProbe, percent_used};

use crate::error::Error;
use async_trait::async_trait;

/// Reads how full the runtime's storage is.
#[async_trait]
pub trait DiskProbe: Send + Sync {
    /// Used space of the runtime's storage filesystem, in whole percent.
    async fn used_space_percent(&self) -> Result<u8, Error>;
}
