#![forbid(unsafe_code)]

//! Point-in-time views of what could be reclaimed.

mod snapshot;
mod usage;

pub use snapshot::Snapshot;

use crate::domain::EntityKind;
use crate::error::Error;
use crate::metrics::{MetricsSink, amount_metric};
use crate::runtime::{ContainerRecord, ContainerRuntime, ContainerStatus};
use chrono::{DateTime, Utc};
use config::ContainerAgeBasis;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Concurrent inspect/history requests issued against the runtime.
const INSPECT_CONCURRENCY: usize = 8;

#[derive(Clone)]
pub struct Inventory {
    runtime: Arc<dyn ContainerRuntime>,
    metrics: Arc<dyn MetricsSink>,
    age_basis: ContainerAgeBasis,
}

impl Inventory {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        metrics: Arc<dyn MetricsSink>,
        age_basis: ContainerAgeBasis,
    ) -> Self {
        Self {
            runtime,
            metrics,
            age_basis,
        }
    }

    /// Snapshot of `kind` entities that may be deleted.
    ///
    /// A failed listing is logged and yields an empty snapshot.
    pub async fn list_reclaimable(&self, kind: EntityKind) -> Snapshot {
        let result = match kind {
            EntityKind::Container => self.reclaimable_containers().await,
            EntityKind::Image => self.reclaimable_images().await,
        };
        result.unwrap_or_else(|err| {
            let err = Error::InventoryUnavailable {
                kind,
                source: Box::new(err),
            };
            error!(%kind, %err, "inventory unavailable, nothing to reclaim this cycle");
            Snapshot::new(kind)
        })
    }

    /// Image ids reachable from running containers, directly or through
    /// their image history.
    pub async fn used_images(&self) -> HashSet<String> {
        usage::used_images(self.runtime.as_ref(), INSPECT_CONCURRENCY).await
    }

    async fn reclaimable_containers(&self) -> Result<Snapshot, Error> {
        let containers = self
            .runtime
            .list_containers(&[ContainerStatus::Exited, ContainerStatus::Dead])
            .await?;
        self.metrics.gauge(
            amount_metric(EntityKind::Container),
            containers.len() as f64,
        );

        let mut snapshot = Snapshot::new(EntityKind::Container);
        match self.age_basis {
            ContainerAgeBasis::Created => {
                for container in containers {
                    snapshot.insert(container.created, container.id);
                }
            }
            ContainerAgeBasis::Finished => {
                let stamped: Vec<_> = stream::iter(containers)
                    .map(|container| self.finished_timestamp(container))
                    .buffered(INSPECT_CONCURRENCY)
                    .collect()
                    .await;
                for (id, timestamp) in stamped.into_iter().flatten() {
                    snapshot.insert(timestamp, id);
                }
            }
        }
        debug!(count = snapshot.len(), "reclaimable containers");
        Ok(snapshot)
    }

    /// Exit time of `container`, falling back to creation time. `None` skips
    /// the container.
    async fn finished_timestamp(
        &self,
        container: ContainerRecord,
    ) -> Option<(String, DateTime<Utc>)> {
        match self.runtime.inspect_container(&container.id).await {
            Ok(details) if details.running => {
                debug!(id = %container.id, "container restarted since listing, skipping");
                None
            }
            Ok(details) => Some((
                container.id,
                details.finished_at.unwrap_or(container.created),
            )),
            Err(err) => {
                warn!(id = %container.id, %err, "failed to inspect container, skipping");
                None
            }
        }
    }

    async fn reclaimable_images(&self) -> Result<Snapshot, Error> {
        let images = self.runtime.list_images(true).await?;
        self.metrics
            .gauge(amount_metric(EntityKind::Image), images.len() as f64);

        let used = self.used_images().await;
        let mut snapshot = Snapshot::new(EntityKind::Image);
        for image in images {
            if used.contains(&image.id) {
                continue;
            }
            snapshot.insert(image.created, image.id);
        }
        debug!(
            count = snapshot.len(),
            used = used.len(),
            "reclaimable images"
        );
        Ok(snapshot)
    }
}
