use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which timestamp a stopped container's age is measured from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerAgeBasis {
    /// Exit time reported by the runtime. Containers whose exit time is
    /// unknown fall back to their creation time.
    #[default]
    Finished,

    /// Creation time, regardless of when the container stopped.
    Created,
}

impl FromStr for ContainerAgeBasis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finished" => Ok(Self::Finished),
            "created" => Ok(Self::Created),
            other => Err(Error::InvalidAgeBasis(other.to_owned())),
        }
    }
}
