#![forbid(unsafe_code)]
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reclaimer::error::Error;
use reclaimer::metrics::MetricsSink;
use reclaimer::probe::DiskProbe;
use reclaimer::runtime::{
    ContainerDetails, ContainerRecord, ContainerRuntime, ContainerStatus, HistoryEntry,
    ImageRecord, RemoveImage, RuntimeInfo,
};
use reclaimer::{FixedClock, ReclamationPolicy, Services};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn ago(secs: i64) -> DateTime<Utc> {
    now() - TimeDelta::seconds(secs)
}

pub fn policy(high: u8, low: u8) -> ReclamationPolicy {
    ReclamationPolicy::new(Duration::from_secs(60), Duration::from_secs(3600), high, low).unwrap()
}

#[derive(Debug, Clone)]
struct FakeContainer {
    record: ContainerRecord,
    status: ContainerStatus,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct FakeState {
    images: Vec<ImageRecord>,
    containers: Vec<FakeContainer>,
    history: HashMap<String, Vec<String>>,
    failing_removals: HashSet<String>,
    failing_history: HashSet<String>,
    failing_inspect: HashSet<String>,
    fail_listing: bool,
    removed: Vec<String>,
    image_removals: Vec<(String, RemoveImage)>,
}

/// In-memory runtime. Deletions take effect on later listings.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, id: &str, created: DateTime<Utc>) -> Self {
        self.state.lock().unwrap().images.push(ImageRecord {
            id: id.to_owned(),
            created,
        });
        self
    }

    pub fn with_container(
        self,
        id: &str,
        image: &str,
        status: ContainerStatus,
        created: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.with_container_on(id, image, Some(image), status, created, finished_at)
    }

    /// A container whose tag `image` no longer names the image it runs.
    pub fn with_container_on(
        self,
        id: &str,
        image: &str,
        image_id: Option<&str>,
        status: ContainerStatus,
        created: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.state.lock().unwrap().containers.push(FakeContainer {
            record: ContainerRecord {
                id: id.to_owned(),
                image: image.to_owned(),
                image_id: image_id.map(str::to_owned),
                created,
            },
            status,
            finished_at,
        });
        self
    }

    pub fn with_history(self, image: &str, ancestors: &[&str]) -> Self {
        self.state.lock().unwrap().history.insert(
            image.to_owned(),
            ancestors.iter().map(|id| (*id).to_owned()).collect(),
        );
        self
    }

    pub fn failing_removal(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_removals
            .insert(id.to_owned());
        self
    }

    pub fn failing_history(self, image: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_history
            .insert(image.to_owned());
        self
    }

    pub fn failing_inspect(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_inspect
            .insert(id.to_owned());
        self
    }

    pub fn failing_listing(self) -> Self {
        self.state.lock().unwrap().fail_listing = true;
        self
    }

    /// Ids deleted so far, in deletion order.
    pub fn removed(&self) -> Vec<String> {
        self.state.lock().unwrap().removed.clone()
    }

    pub fn image_removals(&self) -> Vec<(String, RemoveImage)> {
        self.state.lock().unwrap().image_removals.clone()
    }

    pub fn image_count(&self) -> usize {
        self.state.lock().unwrap().images.len()
    }

    fn unavailable() -> Error {
        Error::RuntimeUnavailable("connection refused".to_owned())
    }

    fn not_found(operation: &'static str, id: &str) -> Error {
        Error::RuntimeApi {
            operation,
            message: format!("404: no such object: {id}"),
        }
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn ping(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn list_images(&self, _all: bool) -> Result<Vec<ImageRecord>, Error> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(Self::unavailable());
        }
        Ok(state.images.clone())
    }

    async fn list_containers(
        &self,
        statuses: &[ContainerStatus],
    ) -> Result<Vec<ContainerRecord>, Error> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(Self::unavailable());
        }
        Ok(state
            .containers
            .iter()
            .filter(|container| statuses.contains(&container.status))
            .map(|container| container.record.clone())
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, Error> {
        let state = self.state.lock().unwrap();
        if state.failing_inspect.contains(id) {
            return Err(Self::unavailable());
        }
        let container = state
            .containers
            .iter()
            .find(|container| container.record.id == id)
            .ok_or_else(|| Self::not_found("inspect container", id))?;
        Ok(ContainerDetails {
            id: id.to_owned(),
            finished_at: container.finished_at,
            running: container.status == ContainerStatus::Running,
        })
    }

    async fn image_history(&self, image: &str) -> Result<Vec<HistoryEntry>, Error> {
        let state = self.state.lock().unwrap();
        if state.failing_history.contains(image) {
            return Err(Self::unavailable());
        }
        let mut entries = vec![HistoryEntry {
            id: image.to_owned(),
        }];
        entries.extend(
            state
                .history
                .get(image)
                .into_iter()
                .flatten()
                .map(|id| HistoryEntry { id: id.clone() }),
        );
        Ok(entries)
    }

    async fn remove_image(&self, id: &str, options: RemoveImage) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if state.failing_removals.contains(id) {
            return Err(Error::RuntimeApi {
                operation: "remove image",
                message: format!("409: conflict: unable to delete {id}"),
            });
        }
        let index = state
            .images
            .iter()
            .position(|image| image.id == id)
            .ok_or_else(|| Self::not_found("remove image", id))?;
        state.images.remove(index);
        state.removed.push(id.to_owned());
        state.image_removals.push((id.to_owned(), options));
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if state.failing_removals.contains(id) {
            return Err(Error::RuntimeApi {
                operation: "remove container",
                message: format!("409: conflict: container {id} is in use"),
            });
        }
        let index = state
            .containers
            .iter()
            .position(|container| container.record.id == id)
            .ok_or_else(|| Self::not_found("remove container", id))?;
        state.containers.remove(index);
        state.removed.push(id.to_owned());
        Ok(())
    }

    async fn info(&self) -> Result<RuntimeInfo, Error> {
        Ok(RuntimeInfo {
            root_dir: PathBuf::from("/var/lib/docker"),
        })
    }
}

/// Returns readings in order and repeats the last one. A `None` reading
/// fails the probe.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    readings: Mutex<VecDeque<Option<u8>>>,
    last: Mutex<Option<Option<u8>>>,
    calls: Mutex<usize>,
}

impl ScriptedProbe {
    pub fn new(readings: impl IntoIterator<Item = u8>) -> Self {
        Self::with_failures(readings.into_iter().map(Some))
    }

    pub fn with_failures(readings: impl IntoIterator<Item = Option<u8>>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl DiskProbe for ScriptedProbe {
    async fn used_space_percent(&self) -> Result<u8, Error> {
        *self.calls.lock().unwrap() += 1;
        let mut last = self.last.lock().unwrap();
        let reading = match self.readings.lock().unwrap().pop_front() {
            Some(reading) => {
                *last = Some(reading);
                reading
            }
            None => (*last).flatten(),
        };
        reading.ok_or_else(|| Error::ProbeFailed("statvfs failed".to_owned()))
    }
}

/// Usage derived from how many images remain in a [`FakeRuntime`].
pub struct ImageCountProbe {
    pub runtime: Arc<FakeRuntime>,
    pub base: u8,
    pub per_image: u8,
}

#[async_trait]
impl DiskProbe for ImageCountProbe {
    async fn used_space_percent(&self) -> Result<u8, Error> {
        let images = u8::try_from(self.runtime.image_count()).unwrap_or(u8::MAX);
        Ok(self
            .base
            .saturating_add(images.saturating_mul(self.per_image))
            .min(100))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Count {
        name: String,
        delta: i64,
        tags: Vec<String>,
    },
    Gauge {
        name: String,
        value: f64,
    },
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    samples: Mutex<Vec<Sample>>,
}

impl RecordingSink {
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().unwrap().clone()
    }

    pub fn total(&self, metric: &str) -> i64 {
        self.samples()
            .iter()
            .filter_map(|sample| match sample {
                Sample::Count { name, delta, .. } if name == metric => Some(*delta),
                _ => None,
            })
            .sum()
    }

    pub fn last_gauge(&self, metric: &str) -> Option<f64> {
        self.samples()
            .iter()
            .rev()
            .find_map(|sample| match sample {
                Sample::Gauge { name, value } if name == metric => Some(*value),
                _ => None,
            })
    }
}

impl MetricsSink for RecordingSink {
    fn count(&self, name: &str, delta: i64, tags: &[&str], _sample_rate: f64) {
        self.samples.lock().unwrap().push(Sample::Count {
            name: name.to_owned(),
            delta,
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
        });
    }

    fn gauge(&self, name: &str, value: f64) {
        self.samples.lock().unwrap().push(Sample::Gauge {
            name: name.to_owned(),
            value,
        });
    }
}

pub fn services(
    runtime: Arc<FakeRuntime>,
    probe: Arc<dyn DiskProbe>,
    metrics: Arc<RecordingSink>,
) -> Services {
    Services {
        runtime,
        probe,
        metrics,
        clock: Arc::new(FixedClock(now())),
    }
}
