#![forbid(unsafe_code)]

mod item;
mod kind;
mod outcome;
mod policy;

pub use item::InventoryItem;
pub(crate) use item::age_between;
pub use kind::EntityKind;
pub use outcome::CleanupOutcome;
pub use policy::{DEFAULT_BATCH_SIZE, ReclamationPolicy};
