use anyhow::{Context, bail};
use slipwatch_core::{CatalogEntry, Period, build_catalog};
use slipwatch_store::RevisionStore;
use slipwatch_sync::{ClientConfig, SlipClient};
use slipwatch_watch::{Settings, Watcher};
use tracing::{info, warn};

use crate::console::ConsoleObserver;

/// Run one pass, or poll until Ctrl-C when an interval is configured.
pub async fn check(config: ClientConfig, settings: Settings, verbose: bool) -> anyhow::Result<()> {
    let client = SlipClient::new(config).context("cannot build HTTP client")?;
    let interval = settings.poll_interval;
    let mut watcher = Watcher::open(client, settings)?;
    let mut observer = ConsoleObserver::new(verbose);

    match interval {
        Some(interval) => {
            let passes = watcher
                .run_forever(interval, shutdown_signal(), &mut observer)
                .await;
            info!(passes, "watcher stopped");
        }
        None => {
            tokio::select! {
                report = watcher.run_once(&mut observer) => {
                    info!(
                        checked = report.outcomes.len(),
                        changed = report.changed.len(),
                        failed = report.failures().count(),
                        "pass complete"
                    );
                }
                () = shutdown_signal() => info!("interrupted during pass"),
            }
        }
    }
    Ok(())
}

/// Print the merged catalog without probing any document.
pub async fn catalog(config: ClientConfig, settings: &Settings, json: bool) -> anyhow::Result<()> {
    let client = SlipClient::new(config).context("cannot build HTTP client")?;
    let build = build_catalog(
        &client,
        settings.period_range(Period::current()),
        settings.identity_filter.as_ref(),
    )
    .await;

    for summary in build.unavailable() {
        if let Err(e) = &summary.listed {
            eprintln!("Error: '{e}'");
        }
    }

    if json {
        let entries: Vec<&CatalogEntry> = build.catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in build.catalog.iter() {
            println!("{}\t{}\t{}", entry.period, entry.identity, entry.location);
        }
    }
    Ok(())
}

/// List on-disk anomalies; fails when any are found.
pub fn verify(settings: &Settings) -> anyhow::Result<()> {
    let store = RevisionStore::open(&settings.store_root)?;
    let anomalies = store.anomalies()?;
    for anomaly in &anomalies {
        println!("{}\t{}", anomaly.kind.as_str(), anomaly.path.display());
    }
    if !anomalies.is_empty() {
        bail!(
            "{} anomalies under {}",
            anomalies.len(),
            store.root().display()
        );
    }
    println!("no anomalies under {}", store.root().display());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
