//! Cue CLI
//!
//! Check cue files and simulate them headlessly.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cue_animation::Sequencer;
use cue_object::{CueNotification, CueState, ObjectCue, RecordingOutput, SceneObject};
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cue_file;

use cue_file::CueFile;

#[derive(Parser)]
#[command(name = "cue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Object cue tooling", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a cue file and summarize its timing
    Check {
        /// Cue file (TOML)
        file: PathBuf,
    },

    /// Run a cue on an in-memory object
    Simulate {
        /// Cue file (TOML)
        file: PathBuf,

        /// Seconds to simulate
        #[arg(short, long, default_value = "10.0")]
        duration: f32,

        /// Frames per second
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Request a stop at this time (seconds)
        #[arg(long)]
        stop_at: Option<f32>,

        /// Request a start again at this time (seconds)
        #[arg(long)]
        restart_at: Option<f32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Check { file } => cmd_check(&file),
        Commands::Simulate {
            file,
            duration,
            fps,
            stop_at,
            restart_at,
            json,
        } => cmd_simulate(
            &file,
            &SimulateOptions {
                duration,
                fps,
                stop_at,
                restart_at,
                json,
            },
        ),
    }
}

fn cmd_check(path: &Path) -> Result<()> {
    let file = CueFile::load(path)?;
    let cue = ObjectCue::new(file.config, Sequencer::new(), file.object)?;
    let config = cue.config();
    let timing = cue.timing();

    info!("Checked {}", path.display());

    println!("Cue: {}", path.display());
    println!();
    println!("Timing:");
    println!("  loop duration:      {:.3}s", timing.loop_duration);
    println!("  half loop:          {:.3}s", timing.half_loop_duration());
    if timing.is_infinite() {
        println!("  loops:              infinite");
    } else {
        println!(
            "  loops:              {} ({} legs)",
            timing.loop_count,
            timing.engine_loop_count()
        );
    }
    println!("  graceful duration:  {:.3}s", config.graceful_duration);
    println!("  return policy:      {:?}", config.return_policy);
    if config.auto_start {
        println!("  auto start after:   {:.3}s", config.start_delay);
    }
    println!();

    let active: Vec<String> = cue.targets().active().map(|t| t.key().to_string()).collect();
    println!(
        "Properties: {} tracked, {} active",
        cue.targets().len(),
        active.len()
    );
    for key in &active {
        println!("  - {}", key);
    }
    if active.is_empty() {
        println!("  (none: the cue will not move the object)");
    }

    let audio = &config.audio;
    if audio.cue_clip.is_some() || audio.stop_clip.is_some() {
        println!();
        println!("Audio:");
        if let Some(clip) = &audio.cue_clip {
            let mode = if audio.play_halfway {
                "halfway through each leg"
            } else {
                "at each leg"
            };
            println!("  cue clip:  {} ({})", clip, mode);
        }
        if let Some(clip) = &audio.stop_clip {
            println!("  stop clip: {}", clip);
        }
    }

    Ok(())
}

struct SimulateOptions {
    duration: f32,
    fps: u32,
    stop_at: Option<f32>,
    restart_at: Option<f32>,
    json: bool,
}

#[derive(Serialize)]
struct Transition {
    time: f32,
    from: String,
    to: String,
}

#[derive(Serialize)]
struct SimulationReport {
    duration: f32,
    frames: u64,
    final_state: String,
    remaining_return_duration: f32,
    transitions: Vec<Transition>,
    sounds: Vec<String>,
    notifications: Vec<String>,
    object: SceneObject,
}

fn cmd_simulate(path: &Path, options: &SimulateOptions) -> Result<()> {
    if options.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }
    if !options.duration.is_finite() || options.duration < 0.0 {
        anyhow::bail!("--duration must be zero or more, got {}", options.duration);
    }

    let file = CueFile::load(path)?;
    let auto_start = file.config.auto_start;
    let output = RecordingOutput::new();
    let mut cue =
        ObjectCue::new(file.config, Sequencer::new(), file.object)?.with_audio(output.clone());

    let notifications = Rc::new(RefCell::new(Vec::new()));
    let sink = notifications.clone();
    cue.on_notification(move |n| {
        let name = match n {
            CueNotification::Started => "started",
            CueNotification::Stopped => "stopped",
        };
        sink.borrow_mut().push(name.to_string());
    });

    info!(
        "Simulating {} for {:.3}s at {} fps",
        path.display(),
        options.duration,
        options.fps
    );

    let dt = 1.0 / options.fps as f32;
    let frames = (options.duration / dt).ceil() as u64;
    let mut stop_at = options.stop_at;
    let mut restart_at = options.restart_at;
    let mut transitions = Vec::new();
    let mut state = cue.state();
    let mut heard = 0;
    let mut time = 0.0_f32;

    cue.enable();
    if !auto_start {
        cue.start();
        record_transition(&mut transitions, &mut state, cue.state(), time);
    }

    for _ in 0..frames {
        if stop_at.is_some_and(|at| time >= at) {
            stop_at = None;
            info!("{:>8.3}s  stop requested", time);
            cue.stop();
        }
        if restart_at.is_some_and(|at| time >= at) {
            restart_at = None;
            info!("{:>8.3}s  start requested", time);
            cue.start();
        }

        cue.update(dt);
        time += dt;

        record_transition(&mut transitions, &mut state, cue.state(), time);
        let played = output.played();
        for clip in &played[heard..] {
            info!("{:>8.3}s  sound: {}", time, clip);
        }
        heard = played.len();
    }

    let report = SimulationReport {
        duration: time,
        frames,
        final_state: cue.state().to_string(),
        remaining_return_duration: cue.remaining_return_duration(),
        transitions,
        sounds: output.played(),
        notifications: notifications.borrow().clone(),
        object: cue.object().clone(),
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn record_transition(
    transitions: &mut Vec<Transition>,
    state: &mut CueState,
    now: CueState,
    time: f32,
) {
    if *state == now {
        return;
    }
    info!("{:>8.3}s  {} -> {}", time, state, now);
    transitions.push(Transition {
        time,
        from: state.to_string(),
        to: now.to_string(),
    });
    *state = now;
}

fn print_report(report: &SimulationReport) {
    println!(
        "Simulated {:.3}s ({} frames), final state: {}",
        report.duration, report.frames, report.final_state
    );
    println!();

    println!("Transitions:");
    for t in &report.transitions {
        println!("  {:>8.3}s  {} -> {}", t.time, t.from, t.to);
    }
    if report.transitions.is_empty() {
        println!("  (none)");
    }

    println!();
    println!("Sounds: {}", report.sounds.join(", "));
    println!("Notifications: {}", report.notifications.join(", "));

    let object = &report.object;
    println!();
    println!("Object:");
    println!("  position: {:?}", object.local_position.to_array());
    println!("  rotation: {:?}", object.local_rotation.to_array());
    println!("  scale:    {:?}", object.local_scale.to_array());
    for (i, surface) in object.surfaces.iter().enumerate() {
        println!(
            "  surface[{}]: base {:?}, emission {:?}",
            i,
            surface.base_color.to_array(),
            surface.emission_color.to_array()
        );
    }
}
