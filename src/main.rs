//! pinchcast
//!
//! Runs the gesture overlay headlessly, driven by the simulated landmark
//! source or by an NDJSON detection replay.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

use pinchcast::audio::{SimulatedMicrophone, VoiceMeter};
use pinchcast::capture::{FileSink, FrameArchiveCapture};
use pinchcast::config::Config;
use pinchcast::gesture::GestureProfile;
use pinchcast::landmarks::replay::ReplaySource;
use pinchcast::landmarks::simulated::SimulatedSource;
use pinchcast::landmarks::LandmarkSource;
use pinchcast::logging;
use pinchcast::render::FaceFilter;
use pinchcast::session::{create_engine_channels, EngineCommand, EngineStatus, FrameLoop};
use pinchcast::ui::LogUi;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    replay: Option<PathBuf>,
    filter: Option<FaceFilter>,
    profile: Option<GestureProfile>,
    frames: Option<u64>,
    record: bool,
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }
    let args = parse_args(&args)?;

    // Held until exit so buffered log lines are flushed
    let _log_guard = logging::init_logging()?;
    info!("pinchcast starting...");

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    info!("Configuration loaded from {:?}", config.config_path()?);

    if let Some(filter) = args.filter {
        config.overlay.face_filter = filter;
    }
    if let Some(profile) = args.profile {
        config.gesture.profile = profile;
    }
    if args.record {
        config.recording.autostart_on_launch = true;
    }

    let runtime = Arc::new(tokio::runtime::Runtime::new()?);
    let (cmd_tx, cmd_rx, status_tx, status_rx) = create_engine_channels();

    // Surface saved files and errors from the engine
    runtime.spawn(log_status(status_rx));

    let engine_runtime = runtime.clone();
    let engine_handle = std::thread::spawn(move || {
        engine_runtime.block_on(async move {
            if let Err(e) = run_engine(config, args, cmd_rx, status_tx).await {
                error!("Engine error: {:#}", e);
            }
        });
    });

    let ctrl_c_tx = cmd_tx.clone();
    let ctrl_c_runtime = runtime.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        let tx = ctrl_c_tx.clone();
        ctrl_c_runtime.spawn(async move {
            let _ = tx.send(EngineCommand::Shutdown).await;
        });
    })
    .context("Failed to install Ctrl+C handler")?;

    info!("Press Ctrl+C to exit...");
    let _ = engine_handle.join();

    info!("Shutdown complete");
    Ok(())
}

async fn run_engine(
    config: Config,
    args: Args,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    status_tx: broadcast::Sender<EngineStatus>,
) -> Result<()> {
    match &args.replay {
        Some(path) => {
            let source = ReplaySource::open(path)
                .await
                .with_context(|| format!("Failed to open replay file: {:?}", path))?;
            drive(config, source, cmd_rx, status_tx).await;
        }
        None => {
            let mut source = SimulatedSource::new(config.reference_resolution());
            if let Some(limit) = args.frames {
                source = source.with_frame_limit(limit);
            }
            drive(config, source, cmd_rx, status_tx).await;
        }
    }
    Ok(())
}

async fn drive<S: LandmarkSource>(
    config: Config,
    source: S,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    status_tx: broadcast::Sender<EngineStatus>,
) {
    let sink = FileSink::new(config.output_directory());
    info!("Recordings will be saved to {:?}", sink.directory());

    let mut frame_loop = FrameLoop::new(config, source, FrameArchiveCapture::new(), sink, Box::new(LogUi::new()))
        .with_channels(cmd_rx, status_tx)
        .with_voice_meter(VoiceMeter::new(Box::new(SimulatedMicrophone::new())));

    frame_loop.run().await;
}

async fn log_status(mut status_rx: broadcast::Receiver<EngineStatus>) {
    loop {
        match status_rx.recv().await {
            Ok(EngineStatus::Saved { path }) => info!("Recording saved: {}", path.display()),
            Ok(EngineStatus::Error(message)) => error!("{}", message),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--config" => parsed.config = Some(PathBuf::from(value(&mut iter, arg)?)),
            "-r" | "--replay" => parsed.replay = Some(PathBuf::from(value(&mut iter, arg)?)),
            "-f" | "--filter" => {
                let name = value(&mut iter, arg)?;
                parsed.filter = Some(name.parse().map_err(anyhow::Error::msg)?);
            }
            "-p" | "--profile" => {
                parsed.profile = Some(match value(&mut iter, arg)?.as_str() {
                    "full" => GestureProfile::Full,
                    "compact" => GestureProfile::Compact,
                    other => bail!("unknown gesture profile '{}'", other),
                });
            }
            "-n" | "--frames" => {
                let count = value(&mut iter, arg)?;
                parsed.frames = Some(
                    count
                        .parse()
                        .with_context(|| format!("invalid frame count '{}'", count))?,
                );
            }
            "--record" => parsed.record = true,
            other => bail!("unknown argument '{}' (see --help)", other),
        }
    }

    Ok(parsed)
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a String> {
    iter.next().with_context(|| format!("{} requires a value", flag))
}

fn print_help() {
    println!("pinchcast - Gesture overlay with pinch-to-record");
    println!();
    println!("USAGE:");
    println!("    pinchcast [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help              Print this help message");
    println!("    -c, --config <PATH>     Use this config file instead of the default");
    println!("    -r, --replay <PATH>     Replay NDJSON detections instead of the simulated hand");
    println!("    -f, --filter <NAME>     Face filter: none, dog, cat, bunny, glasses");
    println!("    -p, --profile <NAME>    Gesture thresholds: full, compact");
    println!("    -n, --frames <N>        Stop the simulated source after N frames");
    println!("        --record            Start recording as soon as video is available");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG                Set log level (e.g., debug, info, warn)");
    println!("    PINCHCAST_LOG_PATH      Override the log directory");
}
