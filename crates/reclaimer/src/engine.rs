#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::domain::{CleanupOutcome, EntityKind, ReclamationPolicy};
use crate::error::Error;
use crate::inventory::Inventory;
use crate::metrics::{CLEAN_START, DEFAULT_SAMPLE_RATE, MetricsSink};
use crate::probe::DiskProbe;
use crate::reclaim::{Convergence, ConvergenceReport, Reclaimer};
use crate::runtime::ContainerRuntime;
use crate::scheduler::Scheduler;
use config::{ContainerAgeBasis, Mode};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct Services {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub probe: Arc<dyn DiskProbe>,
    pub metrics: Arc<dyn MetricsSink>,
    pub clock: Arc<dyn Clock>,
}

/// Policy entry points over a container runtime.
///
/// Cheap to clone; clones share the same collaborators. Nothing is cached
/// between runs: every run takes a fresh inventory.
#[derive(Clone)]
pub struct ReclaimEngine {
    policy: ReclamationPolicy,
    inventory: Inventory,
    reclaimer: Reclaimer,
    probe: Arc<dyn DiskProbe>,
    metrics: Arc<dyn MetricsSink>,
}

impl ReclaimEngine {
    pub fn new(policy: ReclamationPolicy, services: Services) -> Self {
        Self::with_container_age(policy, services, ContainerAgeBasis::default())
    }

    pub fn with_container_age(
        policy: ReclamationPolicy,
        services: Services,
        age_basis: ContainerAgeBasis,
    ) -> Self {
        let Services {
            runtime,
            probe,
            metrics,
            clock,
        } = services;
        Self {
            policy,
            inventory: Inventory::new(runtime.clone(), metrics.clone(), age_basis),
            reclaimer: Reclaimer::new(runtime, metrics.clone(), clock),
            probe,
            metrics,
        }
    }

    /// Delete unused images older than `ttl`.
    pub async fn clean_images(&self, ttl: Duration) -> usize {
        let snapshot = self.inventory.list_reclaimable(EntityKind::Image).await;
        self.reclaimer.reclaim_by_age(&snapshot, ttl).await
    }

    /// Delete exited or dead containers older than `ttl`.
    pub async fn clean_containers(&self, ttl: Duration) -> usize {
        let snapshot = self.inventory.list_reclaimable(EntityKind::Container).await;
        self.reclaimer.reclaim_by_age(&snapshot, ttl).await
    }

    /// TTL policy for both kinds. Containers go first so the images they
    /// held become unused.
    pub async fn clean_all(&self) -> CleanupOutcome {
        self.clean_all_with(&self.policy).await
    }

    /// [`ReclaimEngine::clean_all`] with both TTLs at zero.
    pub async fn emergency(&self) -> CleanupOutcome {
        info!("emergency cleanup, ignoring TTLs");
        self.clean_all_with(&self.policy.emergency()).await
    }

    async fn clean_all_with(&self, policy: &ReclamationPolicy) -> CleanupOutcome {
        info!("cleaning all images and containers");
        self.metrics.count(CLEAN_START, 1, &[], DEFAULT_SAMPLE_RATE);

        let removed_containers = self.clean_containers(policy.ttl_containers()).await;
        let removed_images = self.clean_images(policy.ttl_images()).await;
        CleanupOutcome {
            removed_containers,
            removed_images,
        }
    }

    /// One run of the TTL policy.
    pub async fn ttl_cycle(&self) -> CleanupOutcome {
        let outcome = self.clean_all().await;
        info!(
            removed_containers = outcome.removed_containers,
            removed_images = outcome.removed_images,
            "ttl cleanup finished"
        );
        outcome
    }

    /// One run of the disk-space policy: a container TTL sweep, then image
    /// batches while disk usage is above the low watermark.
    ///
    /// `clean.start` is only counted once usage reaches the high watermark.
    pub async fn disk_space_cycle(&self) -> ConvergenceReport {
        let removed_containers = self.clean_containers(self.policy.ttl_containers()).await;

        let mut report = Convergence::new(&self.inventory, &self.reclaimer, self.probe.as_ref())
            .run(&self.policy)
            .await;
        report.outcome.removed_containers += removed_containers;

        info!(
            removed_containers = report.outcome.removed_containers,
            removed_images = report.outcome.removed_images,
            batches = report.batches,
            used_percent = ?report.used_percent,
            state = %report.final_state,
            "disk space cleanup finished"
        );
        report
    }

    /// Run `mode` once. Continuous modes run a single cycle.
    pub async fn run_once(&self, mode: Mode) -> CleanupOutcome {
        match mode {
            Mode::Images => CleanupOutcome::of(
                EntityKind::Image,
                self.clean_images(self.policy.ttl_images()).await,
            ),
            Mode::Containers => CleanupOutcome::of(
                EntityKind::Container,
                self.clean_containers(self.policy.ttl_containers()).await,
            ),
            Mode::All => self.clean_all().await,
            Mode::Emergency => self.emergency().await,
            Mode::Ttl => self.ttl_cycle().await,
            Mode::Diskspace => self.disk_space_cycle().await.outcome,
        }
    }

    /// Run the cycle of a continuous `mode` every `interval`.
    pub fn schedule(&self, mode: Mode, interval: Duration) -> Result<Scheduler, Error> {
        if !mode.is_continuous() {
            return Err(Error::NotContinuous(mode));
        }
        let engine = self.clone();
        let scheduler = Scheduler::start(interval, move || {
            let engine = engine.clone();
            async move {
                match mode {
                    Mode::Diskspace => {
                        engine.disk_space_cycle().await;
                    }
                    _ => {
                        engine.ttl_cycle().await;
                    }
                }
            }
        })?;
        info!(%mode, ?interval, "continuous run started");
        Ok(scheduler)
    }
}
