use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Metrics {
    /// Send statsd metrics at all. Reclamation behaves the same either way.
    pub enabled: bool,

    /// UDP address of the statsd agent.
    pub address: String,

    /// Prefix prepended to every metric name.
    pub namespace: String,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "127.0.0.1:8125".to_owned(),
            namespace: "dockergc.".to_owned(),
        }
    }
}
