#![forbid(unsafe_code)]

use crate::error::Error;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Validated reclamation thresholds.
///
/// Built once at startup and read-only afterwards. Construction fails unless
/// `0 <= low_water_mark <= high_water_mark <= 100` and the batch size is
/// non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclamationPolicy {
    ttl_containers: Duration,
    ttl_images: Duration,
    high_water_mark: u8,
    low_water_mark: u8,
    batch_size: usize,
    pressure_min_image_age: Duration,
}

impl ReclamationPolicy {
    pub fn new(
        ttl_containers: Duration,
        ttl_images: Duration,
        high_water_mark: u8,
        low_water_mark: u8,
    ) -> Result<Self, Error> {
        if high_water_mark > 100 {
            return Err(Error::InvalidPolicy(format!(
                "high disk space threshold {high_water_mark}% is not a percentage"
            )));
        }
        if low_water_mark > high_water_mark {
            return Err(Error::InvalidPolicy(format!(
                "low disk space threshold {low_water_mark}% is above high threshold {high_water_mark}%"
            )));
        }
        Ok(Self {
            ttl_containers,
            ttl_images,
            high_water_mark,
            low_water_mark,
            batch_size: DEFAULT_BATCH_SIZE,
            pressure_min_image_age: Duration::ZERO,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, Error> {
        if batch_size == 0 {
            return Err(Error::InvalidPolicy(
                "batch size must be at least 1".to_owned(),
            ));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    pub fn with_pressure_min_image_age(mut self, age: Duration) -> Self {
        self.pressure_min_image_age = age;
        self
    }

    /// The same policy with both keep-durations set to zero.
    pub fn emergency(&self) -> Self {
        Self {
            ttl_containers: Duration::ZERO,
            ttl_images: Duration::ZERO,
            ..*self
        }
    }

    pub fn ttl_containers(&self) -> Duration {
        self.ttl_containers
    }

    pub fn ttl_images(&self) -> Duration {
        self.ttl_images
    }

    pub fn high_water_mark(&self) -> u8 {
        self.high_water_mark
    }

    pub fn low_water_mark(&self) -> u8 {
        self.low_water_mark
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pressure_min_image_age(&self) -> Duration {
        self.pressure_min_image_age
    }
}

impl TryFrom<&config::Policy> for ReclamationPolicy {
    type Error = Error;

    fn try_from(policy: &config::Policy) -> Result<Self, Self::Error> {
        Ok(Self::new(
            policy.ttl_containers,
            policy.ttl_images,
            policy.high_disk_space_threshold,
            policy.low_disk_space_threshold,
        )?
        .with_batch_size(policy.batch_size)?
        .with_pressure_min_image_age(policy.pressure_min_image_age))
    }
}
