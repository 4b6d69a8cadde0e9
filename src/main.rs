//! fleetwatch daemon: wires the configured adapters into a StatusTimeseries,
//! starts the HealthWorker and ReportWorker under a Supervisor, and runs
//! until interrupted.

mod cli;

use clap::Parser;
use fleetwatch::adapters::http_index_gateway::HttpIndexGateway;
use fleetwatch::adapters::placeholders::{AlwaysOffRuntimeProbe, LoggingMailer};
use fleetwatch::adapters::sqlite_inventory::SqliteInventoryStore;
use fleetwatch::clock::SystemClock;
use fleetwatch::config::Config;
use fleetwatch::contracts::{IndexGateway, InventoryStore, Mailer, RuntimeProbe};
use fleetwatch::errors::MonitorError;
use fleetwatch::health_worker::HealthWorker;
use fleetwatch::report_worker::ReportWorker;
use fleetwatch::supervisor::Supervisor;
use fleetwatch::timeseries::StatusTimeseries;
use fleetwatch::{logging, startup};
use std::sync::Arc;

type Adapters = (
    Arc<dyn InventoryStore>,
    Arc<dyn RuntimeProbe>,
    Arc<dyn IndexGateway>,
    Arc<dyn Mailer>,
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.apply(Config::from_env()?);

    let _logging_guard = logging::init(&config.logging);

    // spec §7 / SPEC_FULL.md §B: missing SMTP/report-recipient config with
    // the report worker enabled is Fatal, raised before the supervisor
    // starts (and before the startup banner claims a worker layout that
    // will never run) — not a downgrade to a logging stand-in mailer.
    if !config.demo && !config.report_enabled {
        let err = MonitorError::fatal(
            "report worker enabled but no mailer configured \
             (set FLEETWATCH_SMTP_HOST and FLEETWATCH_REPORT_TO, or run with --demo)",
        );
        tracing::error!(error = %err, "refusing to start");
        return Err(err.into());
    }

    startup::print_startup(&config);
    startup::log_startup(&config);

    let (inventory, probe, index, mailer): Adapters = if config.demo {
        build_demo_adapters().await
    } else {
        build_production_adapters(&config)?
    };

    let clock = Arc::new(SystemClock);
    let timeseries = Arc::new(StatusTimeseries::new(index, clock.clone()));

    let health = Arc::new(HealthWorker::new(
        inventory.clone(),
        probe,
        timeseries.clone(),
        config.health_interval,
    ));

    // Only reachable without a configured `report_to` in --demo mode (the
    // Fatal check above guarantees it's `Some` otherwise).
    let report_to = config
        .mailer
        .report_to
        .clone()
        .unwrap_or_else(|| "ops@example.invalid".to_string());
    let report = Arc::new(ReportWorker::new(
        inventory,
        timeseries,
        mailer,
        clock,
        config.report_interval,
        report_to,
    ));

    let supervisor = Supervisor::start(health, Some(report));

    wait_for_shutdown_signal().await?;
    tracing::info!("received shutdown signal");
    supervisor.shutdown().await;

    Ok(())
}

/// Blocks until SIGINT or SIGTERM (spec §4.6/§6: "SIGINT and SIGTERM trigger
/// supervisor shutdown"). SIGTERM has no portable equivalent outside Unix,
/// so non-Unix targets fall back to Ctrl+C alone.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(feature = "testing")]
async fn build_demo_adapters() -> Adapters {
    use fleetwatch::adapters::memory::{
        MemoryIndexGateway, MemoryInventoryStore, MemoryMailer, MemoryRuntimeProbe,
    };
    use fleetwatch::contracts::inventory::NewContainer;
    use fleetwatch::contracts::Status;

    let inventory = Arc::new(MemoryInventoryStore::new());
    let probe = Arc::new(MemoryRuntimeProbe::new());

    for (id, name, ipv4, status) in [
        ("demo-web-1", "web-1", "10.0.0.1", Status::On),
        ("demo-web-2", "web-2", "10.0.0.2", Status::On),
        ("demo-worker-1", "worker-1", "10.0.0.3", Status::Off),
    ] {
        inventory
            .create(NewContainer {
                container_id: id.to_string(),
                container_name: name.to_string(),
                ipv4: ipv4.to_string(),
            })
            .await
            .expect("seeding demo inventory");
        probe.set(id, status).await;
    }

    (
        inventory,
        probe,
        Arc::new(MemoryIndexGateway::new()),
        Arc::new(MemoryMailer::new()),
    )
}

#[cfg(not(feature = "testing"))]
async fn build_demo_adapters() -> Adapters {
    panic!("--demo requires the `testing` feature (enabled by default)");
}

/// Wires the two contracts fleetwatch has a real backing for (SQLite
/// inventory, HTTP index gateway) and falls back to the placeholder
/// `RuntimeProbe`/`Mailer` for the two specified as interface only (spec
/// §4.7) — see `adapters::placeholders` for why those defaults are safe.
fn build_production_adapters(config: &Config) -> anyhow::Result<Adapters> {
    let inventory = Arc::new(SqliteInventoryStore::open(
        config.inventory.db_path.to_str().expect("db path is valid UTF-8"),
    )?);
    let index = Arc::new(HttpIndexGateway::new(
        config.index.url.clone(),
        config.index.username.clone(),
        config.index.password.clone(),
    ));

    Ok((inventory, Arc::new(AlwaysOffRuntimeProbe), index, Arc::new(LoggingMailer)))
}
