use crate::age_basis::ContainerAgeBasis;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "unix:///var/run/docker.sock";

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Runtime {
    /// Docker Engine API endpoint. `unix://` sockets and `tcp://` or
    /// `http://` addresses are accepted.
    pub endpoint: String,

    /// Upper bound for every call made to the runtime. **Measured in
    /// seconds**.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub timeout: Duration,

    /// Directory whose filesystem is measured for the disk space policy.
    /// When unset, the runtime's own root directory (`docker info`) is used.
    pub root_dir: Option<PathBuf>,

    /// Timestamp used to compute the age of a stopped container.
    pub container_age: ContainerAgeBasis,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(120),
            root_dir: None,
            container_age: ContainerAgeBasis::default(),
        }
    }
}
