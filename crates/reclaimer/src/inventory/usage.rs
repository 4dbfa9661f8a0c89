#![forbid(unsafe_code)]

use crate::runtime::{ContainerRecord, ContainerRuntime, ContainerStatus};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, error};

/// History entries the runtime could not resolve to an id.
const MISSING_LAYER: &str = "<missing>";

pub(super) async fn used_images(
    runtime: &dyn ContainerRuntime,
    concurrency: usize,
) -> HashSet<String> {
    let running = match runtime.list_containers(&[ContainerStatus::Running]).await {
        Ok(running) => running,
        Err(err) => {
            error!(%err, "failed to list running containers, no image is marked as used");
            return HashSet::new();
        }
    };

    let chains: Vec<Vec<String>> = stream::iter(running)
        .map(|container| reachable_from(runtime, container))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let used: HashSet<String> = chains.into_iter().flatten().collect();
    debug!(count = used.len(), "images in use");
    used
}

/// Image ids a running container depends on. A failed history lookup keeps
/// the container's own image but leaves its ancestors reclaimable.
///
/// The chain is walked from the image id the container runs, not its tag:
/// a tag may have been re-pulled onto a different image since.
async fn reachable_from(runtime: &dyn ContainerRuntime, container: ContainerRecord) -> Vec<String> {
    let running_image = container
        .image_id
        .clone()
        .unwrap_or_else(|| container.image.clone());
    let mut ids = vec![container.image.clone(), running_image.clone()];

    match runtime.image_history(&running_image).await {
        Ok(history) => ids.extend(
            history
                .into_iter()
                .map(|entry| entry.id)
                .filter(|id| id != MISSING_LAYER),
        ),
        Err(err) => error!(
            container = %container.id,
            image = %running_image,
            %err,
            "failed to read image history, its ancestors stay reclaimable"
        ),
    }
    ids
}
