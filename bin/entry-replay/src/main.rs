use anyhow::{anyhow, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{BarUpdate, Config, EntrySignal};
use strategy::{DetectorFileConfig, DetectorRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    let detector_file = DetectorFileConfig::load(&cfg.detector_config_path)
        .with_context(|| format!("loading detector config '{}'", cfg.detector_config_path))?;
    let registry = DetectorRegistry::from_config(&detector_file)?;
    if registry.is_empty() {
        return Err(anyhow!(
            "no detectors configured in '{}'",
            cfg.detector_config_path
        ));
    }
    info!(feed = %cfg.bar_feed_path, detectors = registry.len(), "Entry replay starting");

    // ── Channels ──────────────────────────────────────────────────────────────
    let (bar_tx, bar_rx) = mpsc::channel::<BarUpdate>(cfg.channel_capacity);
    let (signal_tx, mut signal_rx) = mpsc::channel::<EntrySignal>(cfg.channel_capacity);

    let registry_task = tokio::spawn(registry.run(bar_rx, signal_tx));
    let collector = tokio::spawn(async move {
        let mut count = 0usize;
        while let Some(signal) = signal_rx.recv().await {
            info!(
                detector = %signal.detector,
                pair = %signal.pair,
                period = %signal.period,
                time = %signal.timestamp,
                channel_position = signal.descriptor.channel_position,
                pivot = signal.descriptor.pivot_level,
                "Entry confirmed"
            );
            count += 1;
        }
        count
    });

    // ── Feed ──────────────────────────────────────────────────────────────────
    let file = tokio::fs::File::open(&cfg.bar_feed_path)
        .await
        .with_context(|| format!("opening bar feed '{}'", cfg.bar_feed_path))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    let mut bars = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let update: BarUpdate = serde_json::from_str(&line)
            .with_context(|| format!("parsing bar update on line {line_no}"))?;
        bar_tx
            .send(update)
            .await
            .map_err(|_| anyhow!("detector registry stopped before the feed was drained"))?;
        bars += 1;
    }
    drop(bar_tx);

    registry_task.await?;
    let signals = collector.await?;
    info!(bars, signals, "Entry replay finished");
    Ok(())
}
