#![forbid(unsafe_code)]

use crate::inventory::Snapshot;
use crate::reclaim::Reclaimer;
use std::time::Duration;
use tracing::info;

impl Reclaimer {
    /// Delete every entity in `snapshot` older than `keep`, oldest first.
    ///
    /// Returns the number of successful deletions. Ages are measured once,
    /// against the clock reading taken at the start of the pass.
    pub async fn reclaim_by_age(&self, snapshot: &Snapshot, keep: Duration) -> usize {
        let now = self.now();
        let mut removed = 0;

        for item in snapshot.items() {
            let age = item.age_at(now);
            if age <= keep {
                continue;
            }
            info!(
                kind = %item.kind,
                id = %item.id,
                ?age,
                threshold = ?keep,
                expired_by = ?(age - keep),
                "trying to delete"
            );
            if self.remove(item.kind, &item.id).await {
                removed += 1;
            }
        }
        removed
    }
}
