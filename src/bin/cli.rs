use anyhow::{anyhow, bail, Context, Result};
use crabclip::gesture::{HoldRecorder, TickOutcome, TouchEvent, TouchOutcome};
use crabclip::platform::CameraGuard;
use crabclip::{CameraFacing, CrabClipConfig, DesktopBackend, MediaBackend, RecorderController};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    crabclip::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabclip-cli <devices|profile|record> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "devices" => cmd_devices(&args),
        "profile" => cmd_profile(&args),
        "record" => cmd_record(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_devices(args: &[String]) -> Result<()> {
    let devices = DesktopBackend::list_devices()?;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&devices)?);
    } else {
        for d in devices {
            println!("{}: {}", d.index, d.name);
        }
    }
    Ok(())
}

fn cmd_profile(args: &[String]) -> Result<()> {
    // profile [front|back] [--json]
    let facing = match args.get(2).filter(|a| !a.starts_with("--")) {
        Some(name) => name.parse::<CameraFacing>().map_err(|e| anyhow!(e))?,
        None => CameraFacing::Back,
    };
    let config = CrabClipConfig::load_or_default();

    let mut backend = DesktopBackend::new();
    let camera = CameraGuard::new(backend.open_camera(facing)?);
    let profile = crabclip::Negotiator::default()
        .with_reference_height(config.camera.reference_height)
        .negotiate(&camera.capabilities(), facing);
    drop(camera);

    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&profile)?);
    } else {
        println!("camera:      {}", facing);
        println!("preview:     {}", profile.preview);
        println!("video:       {}", profile.video);
        println!("bitrate:     {} bit/s", profile.bitrate);
        println!("orientation: {}", profile.orientation_hint);
    }
    Ok(())
}

fn cmd_record(args: &[String]) -> Result<()> {
    // record <seconds> [--front] [--dir <path>] [--json]
    let mut seconds: Option<f64> = None;
    let mut facing = None;
    let mut dir = None;
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--front" => facing = Some(CameraFacing::Front),
            "--back" => facing = Some(CameraFacing::Back),
            "--dir" => {
                i += 1;
                dir = Some(args.get(i).context("--dir needs a path")?.clone());
            }
            "--json" => json = true,
            other => {
                seconds = Some(other.parse().with_context(|| format!("bad duration: {}", other))?);
            }
        }
        i += 1;
    }
    let Some(seconds) = seconds else {
        bail!("Usage: crabclip-cli record <seconds> [--front] [--dir <path>] [--json]");
    };

    let mut config = CrabClipConfig::load_or_default();
    if let Some(dir) = dir {
        config.storage.output_directory = dir;
    }
    if let Some(facing) = facing {
        config.camera.default_facing = facing;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let controller = RecorderController::new(Box::new(DesktopBackend::new()), &config.camera);
    let mut recorder = HoldRecorder::new(controller, &config);
    recorder.open_preview()?;

    let tick = Duration::from_millis(config.recording.tick_interval_ms);
    let total_ticks = (seconds * 1000.0 / config.recording.tick_interval_ms as f64).ceil() as u64;

    report(recorder.handle(TouchEvent::Press)?, json)?;
    for _ in 0..total_ticks {
        if cancel.load(Ordering::SeqCst) {
            // Same as swiping past the threshold before letting go
            let drag = -(config.recording.cancel_threshold + 1.0);
            report(recorder.handle(TouchEvent::Drag(drag))?, json)?;
            break;
        }
        std::thread::sleep(tick);
        match recorder.tick()? {
            TickOutcome::Progress { .. } => {}
            TickOutcome::Completed { .. } | TickOutcome::Stopped => break,
        }
    }

    let outcome = recorder.handle(TouchEvent::Release)?;
    report(outcome, json)?;
    if let Some(path) = recorder.confirm() {
        if !json {
            println!("{}", path.display());
        }
    }
    recorder.close();
    Ok(())
}

fn report(outcome: TouchOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        match outcome {
            TouchOutcome::Started { output } => eprintln!("recording to {}", output.display()),
            TouchOutcome::Dragged { cancel_armed: true } => eprintln!("release to cancel"),
            TouchOutcome::Dragged { .. } | TouchOutcome::Ignored => {}
            TouchOutcome::Saved { path } => eprintln!("saved {}", path.display()),
            TouchOutcome::TooShort => eprintln!("clip too short, discarded"),
            TouchOutcome::Cancelled => eprintln!("cancelled"),
        }
    }
    Ok(())
}
