use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Schedule {
    /// What to clean. See [`Mode`] for possible values.
    pub mode: Mode,

    /// How often the continuous modes evaluate their policy. **Measured in
    /// seconds**.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub interval: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            interval: Duration::from_secs(60),
        }
    }
}
