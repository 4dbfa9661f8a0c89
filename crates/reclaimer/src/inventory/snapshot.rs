#![forbid(unsafe_code)]

use crate::domain::{EntityKind, InventoryItem, age_between};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Reclaimable entities of one kind, grouped by timestamp.
///
/// Iteration is oldest first. Ids sharing a timestamp keep the order they
/// were inserted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    kind: EntityKind,
    entries: BTreeMap<DateTime<Utc>, Vec<String>>,
    len: usize,
}

impl Snapshot {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, timestamp: DateTime<Utc>, id: impl Into<String>) {
        self.entries.entry(timestamp).or_default().push(id.into());
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.values().flatten().any(|candidate| candidate == id)
    }

    /// Drop `id`, returning whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let found = self.entries.iter().find_map(|(timestamp, ids)| {
            ids.iter()
                .position(|candidate| candidate == id)
                .map(|index| (*timestamp, index))
        });
        let Some((timestamp, index)) = found else {
            return false;
        };
        if let Some(ids) = self.entries.get_mut(&timestamp) {
            ids.remove(index);
            if ids.is_empty() {
                self.entries.remove(&timestamp);
            }
        }
        self.len -= 1;
        true
    }

    pub fn items(&self) -> impl Iterator<Item = InventoryItem> + '_ {
        self.entries.iter().flat_map(move |(timestamp, ids)| {
            ids.iter()
                .map(move |id| InventoryItem::new(id.clone(), self.kind, *timestamp))
        })
    }

    /// The `n` oldest entities.
    pub fn oldest(&self, n: usize) -> Snapshot {
        let mut batch = Snapshot::new(self.kind);
        for item in self.items().take(n) {
            batch.insert(item.timestamp, item.id);
        }
        batch
    }

    /// Entities whose age at `now` is strictly greater than `min_age`.
    pub fn older_than(&self, now: DateTime<Utc>, min_age: Duration) -> Snapshot {
        let mut older = Snapshot::new(self.kind);
        for (timestamp, ids) in &self.entries {
            if age_between(*timestamp, now) > min_age {
                for id in ids {
                    older.insert(*timestamp, id.clone());
                }
            }
        }
        older
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn iterates_oldest_first_with_stable_ties() {
        let mut snapshot = Snapshot::new(EntityKind::Image);
        snapshot.insert(at(30), "c");
        snapshot.insert(at(10), "a");
        snapshot.insert(at(20), "b1");
        snapshot.insert(at(20), "b2");

        let ids: Vec<_> = snapshot.items().map(|item| item.id).collect();
        assert_eq!(ids, ["a", "b1", "b2", "c"]);
        assert_eq!(snapshot.len(), 4);
    }

    #[test]
    fn oldest_splits_a_timestamp_group() {
        let mut snapshot = Snapshot::new(EntityKind::Image);
        snapshot.insert(at(1), "a");
        snapshot.insert(at(2), "b1");
        snapshot.insert(at(2), "b2");

        let batch = snapshot.oldest(2);
        assert_eq!(batch.len(), 2);
        assert!(batch.contains("a"));
        assert!(batch.contains("b1"));
        assert!(!batch.contains("b2"));
    }

    #[test]
    fn remove_drops_empty_groups() {
        let mut snapshot = Snapshot::new(EntityKind::Container);
        snapshot.insert(at(5), "a");
        snapshot.insert(at(6), "b");

        assert!(snapshot.remove("a"));
        assert!(!snapshot.remove("a"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(
            snapshot.items().map(|item| item.timestamp).collect::<Vec<_>>(),
            [at(6)]
        );
    }

    #[test]
    fn older_than_is_strict() {
        let now = at(1_000);
        let mut snapshot = Snapshot::new(EntityKind::Container);
        snapshot.insert(now - TimeDelta::seconds(60), "exactly");
        snapshot.insert(now - TimeDelta::seconds(61), "older");
        snapshot.insert(now, "fresh");

        let older = snapshot.older_than(now, Duration::from_secs(60));
        assert_eq!(older.len(), 1);
        assert!(older.contains("older"));
    }

    proptest! {
        #[test]
        fn oldest_never_skips_an_older_entity(
            stamps in prop::collection::vec(0i64..50, 0..40),
            n in 0usize..50,
        ) {
            let mut snapshot = Snapshot::new(EntityKind::Image);
            for (i, secs) in stamps.iter().enumerate() {
                snapshot.insert(at(*secs), format!("img-{i}"));
            }

            let batch = snapshot.oldest(n);
            prop_assert_eq!(batch.len(), n.min(stamps.len()));

            let newest_taken = batch.items().last().map(|item| item.timestamp);
            if let Some(newest_taken) = newest_taken {
                for item in snapshot.items() {
                    if item.timestamp < newest_taken {
                        prop_assert!(batch.contains(&item.id));
                    }
                }
            }
        }
    }
}
