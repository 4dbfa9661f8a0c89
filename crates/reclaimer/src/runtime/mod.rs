#![forbid(unsafe_code)]

//! The container runtime as seen by the reclamation engine.
//!
//! Only the handful of inventory and deletion calls the policies need are
//! exposed. Every call is fallible and bounded by the client's own timeout.

mod docker;

pub use docker::BollardRuntime;

use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    Running,
    Exited,
    Dead,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Running => "running",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: String,
    /// Image reference the container was started from, as given by the user.
    pub image: String,
    /// Resolved image id, when the runtime reports it.
    pub image_id: Option<String>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDetails {
    pub id: String,
    /// `None` when the container never finished or the runtime did not say.
    pub finished_at: Option<DateTime<Utc>>,
    pub running: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveImage {
    /// Remove tagged images without untagging them first.
    pub force: bool,
    /// Keep untagged parents, which may still be within their own TTL.
    pub noprune: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub root_dir: PathBuf,
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Check that the runtime answers at all.
    async fn ping(&self) -> Result<(), Error>;

    async fn list_images(&self, all: bool) -> Result<Vec<ImageRecord>, Error>;

    /// List containers whose status is any of `statuses`.
    async fn list_containers(
        &self,
        statuses: &[ContainerStatus],
    ) -> Result<Vec<ContainerRecord>, Error>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, Error>;

    /// Ancestry chain of an image. Only membership is meaningful, not order.
    async fn image_history(&self, image: &str) -> Result<Vec<HistoryEntry>, Error>;

    async fn remove_image(&self, id: &str, options: RemoveImage) -> Result<(), Error>;

    async fn remove_container(&self, id: &str) -> Result<(), Error>;

    async fn info(&self) -> Result<RuntimeInfo, Error>;
}
