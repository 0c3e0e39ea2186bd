//! Crossing Assist - Main Entry Point

use anyhow::Context;
use clap::Parser;
use crossing_assist::{
    build_classifier, build_sink, init_logging, AppConfig, JsonLinesRenderer, Renderer,
    ReplayFrame, SafetySession, TrackReplay,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "crossing-assist", about = "Pedestrian crossing safety from recorded tracks")]
struct Args {
    /// JSON-lines track recording to replay
    #[arg(value_name = "TRACKS")]
    input: PathBuf,
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Write one overlay plan per frame as JSON lines
    #[arg(long, value_name = "PATH")]
    overlay_json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("crossing-assist: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    init_logging(&config.logging)?;

    info!("=== Crossing Assist v{} ===", env!("CARGO_PKG_VERSION"));

    let replay = TrackReplay::open(&args.input)?;
    let classifier = build_classifier(&config.classifier).context("loading scene classifier")?;
    let mut session = SafetySession::from_config(&config, classifier, build_sink(&config.audio));

    let mut renderer = match &args.overlay_json {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating overlay output {}", path.display()))?;
            Some(JsonLinesRenderer::new(BufWriter::new(file)))
        }
        None => None,
    };

    let (tx, mut rx) = mpsc::channel::<ReplayFrame>(config.source.channel_capacity);
    let reader = tokio::task::spawn_blocking(move || {
        for frame in replay {
            match frame {
                Ok(frame) => {
                    if tx.blocking_send(frame).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Stopping replay: {}", e);
                    break;
                }
            }
        }
    });

    let start = Instant::now();
    let frame_period = config.source.frame_period().context("deriving frame period")?;
    let mut index: u32 = 0;
    let mut now = start;

    while let Some(frame) = rx.recv().await {
        let offset = match frame.timestamp_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => frame_period.checked_mul(index),
        };
        index = index.saturating_add(1);

        // Out-of-range timestamps keep the previous frame's clock
        match offset.and_then(|offset| start.checked_add(offset)) {
            Some(t) => now = t,
            None => warn!("Frame {} timestamp out of range, reusing previous", index),
        }

        let outcome = session.process_tracks(frame.width, frame.height, &frame.tracks, now);

        if let Some(renderer) = renderer.as_mut() {
            if let Err(e) = renderer.render(&outcome.overlay()) {
                error!("Overlay output failed on frame {}: {}", outcome.frame, e);
            }
        }
    }

    reader.await.context("replay reader task")?;
    if let Some(renderer) = renderer {
        renderer.into_inner().flush().context("flushing overlay output")?;
    }

    let stats = session.stats();
    info!(
        "Processed {} frames: {} unsafe, {} alerts, {} classifier failures, {} identities evicted",
        stats.frames, stats.unsafe_frames, stats.alerts, stats.classifier_failures, stats.evicted
    );
    Ok(())
}
