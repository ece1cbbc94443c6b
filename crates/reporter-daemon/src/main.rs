use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use reporter_client::HttpReportClient;
use reporter_core::{ReporterConfig, ReporterError};
use reporter_scheduler::SchedulerEngine;
use reporter_sink::CsvSink;

/// Create remote reports on a cadence, poll them and log their results.
#[derive(Debug, Parser)]
#[command(name = "reporter", version)]
struct Cli {
    /// Config file path. Falls back to REPORTER_CONFIG, then ./reporter.toml.
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reporter=info,reporter_scheduler=info,reporter_client=info".into()
            }),
        )
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ReporterError>() {
                Some(re) => error!(code = re.code(), "{re}"),
                None => error!("{e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // config path: --config > REPORTER_CONFIG > ./reporter.toml
    let config_path = resolve_config_path(cli.config, std::env::var("REPORTER_CONFIG").ok());
    let config = ReporterConfig::load(config_path.as_deref())?;

    info!(
        base_url = %config.api.base_url,
        results = %config.sink.path,
        tick_ms = config.schedule.tick_ms,
        create_every = config.schedule.create_every_ticks,
        "reporter starting"
    );

    let client = HttpReportClient::new(&config.api)?;
    let sink = CsvSink::from_config(&config.sink);
    let engine = SchedulerEngine::new(&config.schedule, client, sink, None);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("interrupt received, stopping");
        signal_cancel.cancel();
    });

    engine.run(cancel).await?;
    info!("reporter stopped");
    Ok(())
}

fn resolve_config_path(flag: Option<String>, env: Option<String>) -> Option<String> {
    flag.or(env).filter(|p| !p.trim().is_empty())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
