use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

/// Reclamation thresholds as written in the configuration file.
///
/// The values are not validated here. The engine refuses to start with a
/// policy whose watermarks are out of order or out of range.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Policy {
    /// How long stopped containers are kept. **Measured in seconds**.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub ttl_containers: Duration,

    /// How long unused images are kept. **Measured in seconds**.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub ttl_images: Duration,

    /// Used disk space (percent) at which image reclamation starts in
    /// `diskspace` mode.
    pub high_disk_space_threshold: u8,

    /// Used disk space (percent) image reclamation tries to get back to.
    pub low_disk_space_threshold: u8,

    /// How many of the oldest images are removed before disk usage is
    /// measured again.
    pub batch_size: usize,

    /// Images younger than this are never removed under disk pressure.
    /// **Measured in seconds**.
    ///
    /// ## Note
    ///
    /// Zero lets the disk space policy remove any unused image, which is
    /// what you want on a host that is about to run out of space.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub pressure_min_image_age: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            ttl_containers: Duration::from_secs(60),
            ttl_images: Duration::from_secs(10 * 60 * 60),
            high_disk_space_threshold: 85,
            low_disk_space_threshold: 50,
            batch_size: 10,
            pressure_min_image_age: Duration::ZERO,
        }
    }
}
