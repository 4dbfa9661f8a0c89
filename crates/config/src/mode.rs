use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// What the daemon should do when started.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Remove unused images older than the image TTL, then exit.
    Images,

    /// Remove exited/dead containers older than the container TTL, then exit.
    Containers,

    /// `containers` followed by `images`, then exit.
    All,

    /// Same as `all` with both TTLs forced to zero.
    Emergency,

    /// Run `all` on every tick of the schedule interval.
    #[default]
    Ttl,

    /// On every tick, sweep containers by TTL and reclaim images in batches
    /// once used disk space crosses the high watermark.
    Diskspace,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Images,
        Mode::Containers,
        Mode::All,
        Mode::Emergency,
        Mode::Ttl,
        Mode::Diskspace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Images => "images",
            Mode::Containers => "containers",
            Mode::All => "all",
            Mode::Emergency => "emergency",
            Mode::Ttl => "ttl",
            Mode::Diskspace => "diskspace",
        }
    }

    /// Scheduled modes keep running until the process is stopped.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Mode::Ttl | Mode::Diskspace)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| Error::InvalidMode(s.to_owned()))
    }
}
