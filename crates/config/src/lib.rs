#![forbid(unsafe_code)]

mod age_basis;
mod error;
mod metrics;
mod mode;
mod policy;
mod runtime;
mod schedule;

pub use age_basis::ContainerAgeBasis;
pub use error::Error;
pub use metrics::Metrics;
pub use mode::Mode;
pub use policy::Policy;
pub use runtime::{DEFAULT_ENDPOINT, Runtime};
pub use schedule::Schedule;

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub policy: Policy,
    pub runtime: Runtime,
    pub metrics: Metrics,
    pub schedule: Schedule,
}

impl Config {
    /// Load configuration from a TOML file. Missing fields are filled with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml_edit::de::from_str(&text)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let toml = toml_edit::ser::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from multiple TOML files. Later files override
    /// earlier ones and files that do not exist are skipped.
    pub fn load_multiple<T, U>(paths: U) -> Result<Self, Error>
    where
        T: AsRef<Path>,
        U: IntoIterator<Item = T>,
    {
        let mut merged = toml_edit::DocumentMut::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(path)?;
            let doc: toml_edit::DocumentMut = text.parse()?;
            merge_document(&mut merged, doc);
        }
        let config: Config = toml_edit::de::from_str(&merged.to_string())?;
        Ok(config)
    }
}

fn merge_document(target: &mut toml_edit::DocumentMut, source: toml_edit::DocumentMut) {
    for (key, item) in source.iter() {
        merge_item(
            target.entry(key).or_insert(toml_edit::Item::None),
            item.clone(),
        );
    }
}

fn merge_item(target: &mut toml_edit::Item, source: toml_edit::Item) {
    use toml_edit::Item;
    match (target, source) {
        (Item::Table(target_table), Item::Table(source_table)) => {
            for (key, item) in source_table.iter() {
                merge_item(target_table.entry(key).or_insert(Item::None), item.clone());
            }
        }
        (target_item, source_item) => {
            *target_item = source_item;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.runtime.root_dir = Some(PathBuf::from("/var/lib/docker"));
        config.schedule.mode = Mode::Diskspace;
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[policy]\nttl_images = 3600\n").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.policy.ttl_images, Duration::from_secs(3600));
        assert_eq!(cfg.policy.ttl_containers, Duration::from_secs(60));
        assert_eq!(cfg.policy.batch_size, 10);
        assert_eq!(cfg.runtime.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.schedule.mode, Mode::Ttl);
    }

    #[test]
    fn load_multiple_merges() {
        let dir = tempdir().unwrap();
        let path1 = dir.path().join("a.toml");
        let path2 = dir.path().join("b.toml");
        let missing = dir.path().join("missing.toml");

        std::fs::write(
            &path1,
            "[policy]\nhigh_disk_space_threshold = 90\nlow_disk_space_threshold = 40\n\
             [schedule]\nmode = \"diskspace\"\n",
        )
        .unwrap();
        std::fs::write(
            &path2,
            "[policy]\nlow_disk_space_threshold = 60\n[metrics]\nenabled = false\n",
        )
        .unwrap();

        let cfg = Config::load_multiple([path1, missing, path2]).unwrap();
        assert_eq!(cfg.policy.high_disk_space_threshold, 90);
        assert_eq!(cfg.policy.low_disk_space_threshold, 60);
        assert_eq!(cfg.schedule.mode, Mode::Diskspace);
        assert!(!cfg.metrics.enabled);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[schedule]\nmode = \"continous\"\n").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::DeserializeTOML(_))));
    }

    #[test]
    fn age_basis_is_read_from_runtime_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[runtime]\ncontainer_age = \"created\"\n").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.runtime.container_age, ContainerAgeBasis::Created);
    }
}
