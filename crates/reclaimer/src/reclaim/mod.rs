#![forbid(unsafe_code)]

mod age;
mod convergence;

pub use convergence::{Convergence, ConvergenceReport, ConvergenceState, DoneReason};

use crate::clock::Clock;
use crate::domain::EntityKind;
use crate::error::Error;
use crate::metrics::{DEFAULT_SAMPLE_RATE, MetricsSink, deleted_metric, kind_tag};
use crate::runtime::{ContainerRuntime, RemoveImage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error};

/// Deletes single entities and counts the successes.
#[derive(Clone)]
pub struct Reclaimer {
    runtime: Arc<dyn ContainerRuntime>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
}

impl Reclaimer {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        metrics: Arc<dyn MetricsSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            runtime,
            metrics,
            clock,
        }
    }

    /// Delete one entity. Returns whether the runtime accepted the deletion.
    ///
    /// Images are removed with `force` so tagged images go without untagging
    /// first, and with `noprune` so untagged parents still inside their own
    /// TTL survive.
    pub async fn remove(&self, kind: EntityKind, id: &str) -> bool {
        let result = match kind {
            EntityKind::Image => {
                self.runtime
                    .remove_image(
                        id,
                        RemoveImage {
                            force: true,
                            noprune: true,
                        },
                    )
                    .await
            }
            EntityKind::Container => self.runtime.remove_container(id).await,
        };

        match result {
            Ok(()) => {
                self.metrics.count(
                    deleted_metric(kind),
                    1,
                    &[kind_tag(kind)],
                    DEFAULT_SAMPLE_RATE,
                );
                debug!(%kind, id, "deleted");
                true
            }
            Err(source) => {
                let err = Error::DeletionFailed {
                    kind,
                    id: id.to_owned(),
                    source: Box::new(source),
                };
                error!(%err, "deletion failed");
                false
            }
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
