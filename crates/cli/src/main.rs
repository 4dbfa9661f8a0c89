use anyhow::Context;
use clap::Parser;
use config::Config;
use docker_gc_rs::{
    cli::Cli,
    signals::{SignalEvent, wait_for_signal},
};
use flume::bounded;
use reclaimer::{
    BollardRuntime, ContainerRuntime, MetricsSink, NoopSink, ReclaimEngine, ReclamationPolicy,
    Services, StatsdSink, StatvfsProbe, SystemClock,
};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // NOTE: The verbosity flag takes precedence over the environment variable
    // for log control. `DOCKER_GC_LOG` can only tune the level per crate, eg.
    // `DOCKER_GC_LOG=bollard=debug docker-gc-rs` to see API calls.
    let env_filter = EnvFilter::builder()
        .with_default_directive("bollard=warn".parse()?)
        .with_env_var("DOCKER_GC_LOG")
        .from_env()?
        .add_directive(cli.verbosity.log_level_filter().as_str().parse()?);

    let layer = tracing_subscriber::fmt::layer()
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    // load config
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        _ => {
            let mut candidates = glob::glob("/etc/docker-gc-rs/config.d/*.toml")?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            candidates.insert(0, "/etc/docker-gc-rs/config.toml".into());
            trace!(?candidates, "config file candidates");
            Config::load_multiple(candidates)?
        }
    };
    cli.apply(&mut config);
    debug!(?config, ?cli);

    let policy = ReclamationPolicy::try_from(&config.policy)?;

    let runtime = Arc::new(BollardRuntime::connect(
        &config.runtime.endpoint,
        config.runtime.timeout,
    )?);
    runtime
        .ping()
        .await
        .with_context(|| format!("Failed to reach docker at {}", config.runtime.endpoint))?;

    let metrics: Arc<dyn MetricsSink> = if config.metrics.enabled {
        match StatsdSink::connect(config.metrics.address.as_str(), config.metrics.namespace.as_str())
        {
            Ok(sink) => Arc::new(sink),
            Err(err) => {
                warn!(%err, address = %config.metrics.address, "unable to reach statsd, metrics disabled");
                Arc::new(NoopSink)
            }
        }
    } else {
        Arc::new(NoopSink)
    };

    let probe = Arc::new(StatvfsProbe::new(
        runtime.clone(),
        config.runtime.root_dir.clone(),
    ));
    let engine = ReclaimEngine::with_container_age(
        policy,
        Services {
            runtime,
            probe,
            metrics,
            clock: Arc::new(SystemClock),
        },
        config.runtime.container_age,
    );

    let mode = config.schedule.mode;
    if !mode.is_continuous() {
        let outcome = engine.run_once(mode).await;
        info!(
            %mode,
            removed_containers = outcome.removed_containers,
            removed_images = outcome.removed_images,
            "cleanup finished"
        );
        return Ok(());
    }

    let scheduler = engine.schedule(mode, config.schedule.interval)?;

    // install signal handlers
    let (signals_tx, signals_rx) = bounded(8);
    let mut signal_handle = tokio::spawn(async move { wait_for_signal(signals_tx).await });

    loop {
        tokio::select! {
            // bubble up any errors from the signal handlers
            res = &mut signal_handle => {
                let res = res?;
                if let Err(err) = &res {
                    error!("error happened during handling signals: {}", err);
                }
                res?;
                break;
            }

            // handle the signal events
            event_res = signals_rx.recv_async() => {
                let event = event_res?;
                debug!(?event, "Received signal event");

                match event {
                    SignalEvent::Shutdown => {
                        info!("shutdown requested");
                        break;
                    }
                    SignalEvent::RunNow => {
                        info!(%mode, "running outside the schedule");
                        let engine = engine.clone();
                        tokio::spawn(async move { engine.run_once(mode).await });
                    }
                }
            }
        }
    }

    scheduler.stop();
    scheduler.stopped().await;
    Ok(())
}
