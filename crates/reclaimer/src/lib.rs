#![forbid(unsafe_code)]

pub mod clock;
pub mod domain;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod probe;
pub mod reclaim;
pub mod runtime;
pub mod scheduler;

pub use engine::{ReclaimEngine, Services};
pub use error::Error;
pub use inventory::{Inventory, Snapshot};
pub use metrics::{MetricsSink, NoopSink, StatsdSink};
pub use probe::{DiskProbe, StatvfsProbe};
pub use reclaim::{Convergence, ConvergenceReport, ConvergenceState, DoneReason, Reclaimer};
pub use runtime::{BollardRuntime, ContainerRuntime};
pub use scheduler::Scheduler;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{CleanupOutcome, EntityKind, InventoryItem, ReclamationPolicy};
