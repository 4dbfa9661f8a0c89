#![forbid(unsafe_code)]

use crate::error::Error;
use crate::probe::DiskProbe;
use crate::runtime::ContainerRuntime;
use async_trait::async_trait;
use nix::sys::statvfs::statvfs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Measures the filesystem holding the runtime's root directory.
pub struct StatvfsProbe {
    runtime: Arc<dyn ContainerRuntime>,
    root_dir: Option<PathBuf>,
}

impl StatvfsProbe {
    /// With `root_dir` unset, the directory is asked from the runtime on
    /// every probe.
    pub fn new(runtime: Arc<dyn ContainerRuntime>, root_dir: Option<PathBuf>) -> Self {
        Self { runtime, root_dir }
    }

    async fn root_dir(&self) -> Result<PathBuf, Error> {
        match &self.root_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.runtime.info().await?.root_dir),
        }
    }

    fn measure(path: &Path) -> Result<u8, Error> {
        let stat = statvfs(path)?;
        let total = u64::from(stat.blocks());
        let free = u64::from(stat.blocks_free());
        percent_used(free, total).ok_or_else(|| {
            Error::ProbeFailed(format!("{} reports a zero-sized filesystem", path.display()))
        })
    }
}

/// `floor(100 - free / total * 100)`, or `None` for an empty filesystem.
pub fn percent_used(free: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let free = free.min(total);
    let used = 100.0 - (free as f64 / total as f64 * 100.0);
    Some(used.floor().clamp(0.0, 100.0) as u8)
}

#[async_trait]
impl DiskProbe for StatvfsProbe {
    async fn used_space_percent(&self) -> Result<u8, Error> {
        let path = self.root_dir().await?;
        let used = tokio::task::spawn_blocking(move || Self::measure(&path))
            .await
            .map_err(|err| Error::ProbeFailed(err.to_string()))??;
        trace!(used, "used disk space measured");
        Ok(used)
    }
}
