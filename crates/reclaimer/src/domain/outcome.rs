#![forbid(unsafe_code)]

use crate::domain::EntityKind;
use std::ops::{Add, AddAssign};

/// Number of entities removed by one policy run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub removed_containers: usize,
    pub removed_images: usize,
}

impl CleanupOutcome {
    pub fn of(kind: EntityKind, removed: usize) -> Self {
        match kind {
            EntityKind::Container => Self {
                removed_containers: removed,
                removed_images: 0,
            },
            EntityKind::Image => Self {
                removed_containers: 0,
                removed_images: removed,
            },
        }
    }

    pub fn total(&self) -> usize {
        self.removed_containers + self.removed_images
    }
}

impl Add for CleanupOutcome {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            removed_containers: self.removed_containers + rhs.removed_containers,
            removed_images: self.removed_images + rhs.removed_images,
        }
    }
}

impl AddAssign for CleanupOutcome {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
