#![forbid(unsafe_code)]

use crate::error::Error;
use crate::runtime::{
    ContainerDetails, ContainerRecord, ContainerRuntime, ContainerStatus, HistoryEntry,
    ImageRecord, RemoveImage, RuntimeInfo,
};
use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions, RemoveContainerOptions};
use bollard::errors::Error as BollardError;
use bollard::image::{ListImagesOptions, RemoveImageOptions};
use bollard::{API_DEFAULT_VERSION, Docker};
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, trace};

/// [`ContainerRuntime`] backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct BollardRuntime {
    docker: Docker,
}

impl BollardRuntime {
    /// Build a client for `endpoint`. No request is made until the first call.
    pub fn connect(endpoint: &str, timeout: Duration) -> Result<Self, Error> {
        let timeout = timeout.as_secs().max(1);
        let docker = if endpoint.starts_with("unix://") || endpoint.starts_with('/') {
            Docker::connect_with_unix(endpoint, timeout, API_DEFAULT_VERSION)
        } else {
            Docker::connect_with_http(endpoint, timeout, API_DEFAULT_VERSION)
        }
        .map_err(|err| Error::RuntimeUnavailable(err.to_string()))?;
        debug!(endpoint, timeout, "docker client created");
        Ok(Self { docker })
    }
}

fn map_err(operation: &'static str) -> impl FnOnce(BollardError) -> Error {
    move |err| match err {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => Error::RuntimeApi {
            operation,
            message: format!("{status_code}: {message}"),
        },
        other => Error::RuntimeUnavailable(other.to_string()),
    }
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Parse an RFC 3339 timestamp from the API. The runtime reports "never" as
/// the zero time (`0001-01-01T00:00:00Z`), which maps to `None`.
fn parse_api_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value?).ok()?;
    let parsed = parsed.with_timezone(&Utc);
    (parsed.year() > 1).then_some(parsed)
}

#[async_trait]
impl ContainerRuntime for BollardRuntime {
    async fn ping(&self) -> Result<(), Error> {
        self.docker.ping().await.map_err(map_err("ping"))?;
        Ok(())
    }

    async fn list_images(&self, all: bool) -> Result<Vec<ImageRecord>, Error> {
        let options = ListImagesOptions::<String> {
            all,
            ..Default::default()
        };
        let images = self
            .docker
            .list_images(Some(options))
            .await
            .map_err(map_err("list images"))?;
        trace!(count = images.len(), "images listed");

        Ok(images
            .into_iter()
            .map(|image| ImageRecord {
                id: image.id,
                created: from_unix(image.created),
            })
            .collect())
    }

    async fn list_containers(
        &self,
        statuses: &[ContainerStatus],
    ) -> Result<Vec<ContainerRecord>, Error> {
        let mut filters = HashMap::new();
        filters.insert(
            "status".to_owned(),
            statuses.iter().map(|s| s.as_str().to_owned()).collect(),
        );
        let options = ListContainersOptions::<String> {
            all: true,
            filters,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(map_err("list containers"))?;
        trace!(count = containers.len(), ?statuses, "containers listed");

        Ok(containers
            .into_iter()
            .filter_map(|container| {
                Some(ContainerRecord {
                    id: container.id?,
                    image: container.image.unwrap_or_default(),
                    image_id: container.image_id,
                    created: from_unix(container.created.unwrap_or_default()),
                })
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, Error> {
        let response = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(map_err("inspect container"))?;
        let state = response.state.unwrap_or_default();

        Ok(ContainerDetails {
            id: response.id.unwrap_or_else(|| id.to_owned()),
            finished_at: parse_api_time(state.finished_at.as_deref()),
            running: state.running.unwrap_or(false),
        })
    }

    async fn image_history(&self, image: &str) -> Result<Vec<HistoryEntry>, Error> {
        let history = self
            .docker
            .image_history(image)
            .await
            .map_err(map_err("image history"))?;
        Ok(history
            .into_iter()
            .map(|item| HistoryEntry { id: item.id })
            .collect())
    }

    async fn remove_image(&self, id: &str, options: RemoveImage) -> Result<(), Error> {
        let options = RemoveImageOptions {
            force: options.force,
            noprune: options.noprune,
        };
        self.docker
            .remove_image(id, Some(options), None)
            .await
            .map_err(map_err("remove image"))?;
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<(), Error> {
        self.docker
            .remove_container(id, None::<RemoveContainerOptions>)
            .await
            .map_err(map_err("remove container"))?;
        Ok(())
    }

    async fn info(&self) -> Result<RuntimeInfo, Error> {
        let info = self.docker.info().await.map_err(map_err("info"))?;
        let root_dir = info.docker_root_dir.ok_or_else(|| Error::RuntimeApi {
            operation: "info",
            message: "runtime did not report its root directory".to_owned(),
        })?;
        Ok(RuntimeInfo {
            root_dir: PathBuf::from(root_dir),
        })
    }
}
