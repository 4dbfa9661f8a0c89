#![forbid(unsafe_code)]

use crate::domain::{CleanupOutcome, EntityKind, ReclamationPolicy};
use crate::inventory::Inventory;
use crate::metrics::{CLEAN_START, DEFAULT_SAMPLE_RATE};
use crate::probe::DiskProbe;
use crate::reclaim::Reclaimer;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    /// Usage never reached the high watermark.
    BelowHighWaterMark,
    ReachedLowWaterMark,
    /// Every reclaimable image was deleted before reaching the low watermark.
    Exhausted,
    ProbeFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceState {
    Idle,
    Probing,
    Converging,
    Done(DoneReason),
    /// An iteration deleted nothing while usage stayed above the low
    /// watermark. Needs an operator.
    Stalled,
}

impl fmt::Display for ConvergenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvergenceState::Idle => f.write_str("idle"),
            ConvergenceState::Probing => f.write_str("probing"),
            ConvergenceState::Converging => f.write_str("converging"),
            ConvergenceState::Done(reason) => write!(f, "done ({reason:?})"),
            ConvergenceState::Stalled => f.write_str("stalled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceReport {
    pub outcome: CleanupOutcome,
    /// Non-empty batches handed to the reclaimer.
    pub batches: usize,
    /// Loop iterations, including a final empty one.
    pub iterations: usize,
    pub final_state: ConvergenceState,
    /// Last successful probe reading.
    pub used_percent: Option<u8>,
}

impl Default for ConvergenceReport {
    fn default() -> Self {
        Self {
            outcome: CleanupOutcome::default(),
            batches: 0,
            iterations: 0,
            final_state: ConvergenceState::Idle,
            used_percent: None,
        }
    }
}

/// Deletes the oldest reclaimable images in batches until disk usage drops
/// to the low watermark, re-reading usage after every batch.
pub struct Convergence<'a> {
    inventory: &'a Inventory,
    reclaimer: &'a Reclaimer,
    probe: &'a dyn DiskProbe,
}

impl<'a> Convergence<'a> {
    pub fn new(inventory: &'a Inventory, reclaimer: &'a Reclaimer, probe: &'a dyn DiskProbe) -> Self {
        Self {
            inventory,
            reclaimer,
            probe,
        }
    }

    pub async fn run(&self, policy: &ReclamationPolicy) -> ConvergenceReport {
        let mut report = ConvergenceReport {
            final_state: ConvergenceState::Probing,
            ..Default::default()
        };

        let Some(mut used) = self.read_usage(&mut report).await else {
            return report;
        };
        if used < policy.high_water_mark() {
            debug!(
                used,
                high = policy.high_water_mark(),
                "disk space below high watermark"
            );
            report.final_state = ConvergenceState::Done(DoneReason::BelowHighWaterMark);
            return report;
        }

        info!(
            used,
            high = policy.high_water_mark(),
            low = policy.low_water_mark(),
            "cleaning images to reach low disk space threshold"
        );
        report.final_state = ConvergenceState::Converging;
        self.reclaimer
            .metrics
            .count(CLEAN_START, 1, &[], DEFAULT_SAMPLE_RATE);

        // Images already handed to the reclaimer in this run. Ones that failed
        // are still listed, but must not crowd younger images out of a batch.
        let mut tried: HashSet<String> = HashSet::new();

        while used > policy.low_water_mark() {
            report.iterations += 1;

            let mut reclaimable = self.inventory.list_reclaimable(EntityKind::Image).await;
            for id in &tried {
                reclaimable.remove(id);
            }
            let min_age = policy.pressure_min_image_age();
            let batch = if min_age.is_zero() {
                reclaimable.oldest(policy.batch_size())
            } else {
                reclaimable
                    .older_than(self.reclaimer.now(), min_age)
                    .oldest(policy.batch_size())
            };

            if batch.is_empty() {
                if report.outcome.removed_images > 0 {
                    report.final_state = ConvergenceState::Done(DoneReason::Exhausted);
                    info!(used, "no reclaimable images left");
                } else {
                    report.final_state = ConvergenceState::Stalled;
                    warn!(
                        used,
                        low = policy.low_water_mark(),
                        "no reclaimable images while above low disk space threshold"
                    );
                }
                return report;
            }

            report.batches += 1;
            let mut removed = 0;
            for item in batch.items() {
                if self.reclaimer.remove(item.kind, &item.id).await {
                    removed += 1;
                }
                tried.insert(item.id);
            }
            report.outcome.removed_images += removed;
            debug!(
                batch = report.batches,
                size = batch.len(),
                removed,
                "image batch processed"
            );

            if removed == 0 {
                report.final_state = ConvergenceState::Stalled;
                warn!(
                    used,
                    size = batch.len(),
                    "every deletion in the batch failed, giving up"
                );
                return report;
            }

            used = match self.read_usage(&mut report).await {
                Some(used) => used,
                None => return report,
            };
        }

        report.final_state = ConvergenceState::Done(DoneReason::ReachedLowWaterMark);
        report
    }

    async fn read_usage(&self, report: &mut ConvergenceReport) -> Option<u8> {
        match self.probe.used_space_percent().await {
            Ok(used) => {
                report.used_percent = Some(used);
                Some(used)
            }
            Err(err) => {
                error!(%err, "reading disk space failed");
                report.final_state = ConvergenceState::Done(DoneReason::ProbeFailed);
                None
            }
        }
    }
}
