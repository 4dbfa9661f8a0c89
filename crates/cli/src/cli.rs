use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use config::{Config, Mode};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// docker-gc-rs: Reclaims disk space from a Docker host
///
/// docker-gc-rs deletes stopped containers and unused images once they
/// outlive a time-to-live, or deletes the oldest unused images in batches
/// while the runtime's disk is above a usage threshold.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// If not provided, the default locations are checked. They are
    /// `/etc/docker-gc-rs/config.toml` and `/etc/docker-gc-rs/config.d/*.toml`,
    /// where the latter being a glob pattern. If they don't exist, the default
    /// configuration is used.
    #[arg(short, long, value_parser = validate_file)]
    pub config: Option<PathBuf>,

    /// What to clean.
    ///
    /// `images`, `containers`, `all` and `emergency` run once and exit.
    /// `emergency` is `all` with both TTLs at zero. `ttl` and `diskspace`
    /// keep running and clean every `--interval`.
    #[arg(long, value_parser = validate_mode)]
    pub command: Option<Mode>,

    /// How old unused images are kept, e.g. `10h`.
    #[arg(long, value_parser = validate_duration)]
    pub images_ttl: Option<Duration>,

    /// How old stopped containers are kept, e.g. `1m`.
    #[arg(long, value_parser = validate_duration)]
    pub containers_ttl: Option<Duration>,

    /// How often continuous modes run.
    #[arg(long, value_parser = validate_duration)]
    pub interval: Option<Duration>,

    /// Used disk space, in percent, at which image cleanup starts.
    #[arg(long, value_parser = validate_percent)]
    pub high_disk_space_threshold: Option<u8>,

    /// Used disk space, in percent, at which image cleanup stops.
    #[arg(long, value_parser = validate_percent)]
    pub low_disk_space_threshold: Option<u8>,

    /// Images deleted between two disk space checks.
    #[arg(long, value_parser = validate_batch_size)]
    pub batch_size: Option<usize>,

    /// Statsd address to emit metrics to.
    #[arg(long)]
    pub statsd_address: Option<String>,

    /// Prefix of every metric name.
    #[arg(long)]
    pub statsd_namespace: Option<String>,

    /// Do not emit metrics.
    #[arg(long)]
    pub no_metrics: bool,

    /// Docker Engine API endpoint.
    #[arg(long)]
    pub docker_endpoint: Option<String>,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

impl Cli {
    /// Override `config` with every flag given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.command {
            config.schedule.mode = mode;
        }
        if let Some(interval) = self.interval {
            config.schedule.interval = interval;
        }
        if let Some(ttl) = self.images_ttl {
            config.policy.ttl_images = ttl;
        }
        if let Some(ttl) = self.containers_ttl {
            config.policy.ttl_containers = ttl;
        }
        if let Some(high) = self.high_disk_space_threshold {
            config.policy.high_disk_space_threshold = high;
        }
        if let Some(low) = self.low_disk_space_threshold {
            config.policy.low_disk_space_threshold = low;
        }
        if let Some(batch_size) = self.batch_size {
            config.policy.batch_size = batch_size;
        }
        if let Some(address) = &self.statsd_address {
            config.metrics.address = address.clone();
        }
        if let Some(namespace) = &self.statsd_namespace {
            config.metrics.namespace = namespace.clone();
        }
        if self.no_metrics {
            config.metrics.enabled = false;
        }
        if let Some(endpoint) = &self.docker_endpoint {
            config.runtime.endpoint = endpoint.clone();
        }
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

#[inline(always)]
fn validate_mode(mode: &str) -> Result<Mode, String> {
    mode.parse().map_err(|err: config::Error| err.to_string())
}

#[inline(always)]
fn validate_duration(duration: &str) -> Result<Duration, String> {
    humantime::parse_duration(duration)
        .map_err(|err| format!("`{duration}` is not a valid duration: {err}"))
}

/// Validate a disk space percentage
#[inline(always)]
fn validate_percent(percent: &str) -> Result<u8, String> {
    let percent: u8 = percent
        .parse()
        .map_err(|_| format!("`{percent}` is not a valid percentage"))?;
    if percent <= 100 {
        Ok(percent)
    } else {
        Err("Percentage must be between 0 and 100".to_string())
    }
}

#[inline(always)]
fn validate_batch_size(size: &str) -> Result<usize, String> {
    match size.parse::<usize>() {
        Ok(0) => Err("Batch size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(_) => Err(format!("`{size}` is not a valid batch size")),
    }
}
