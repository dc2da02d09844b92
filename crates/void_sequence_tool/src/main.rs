//! Sequence Tool
//!
//! Command-line front end for authoring and previewing sequences.
//!
//! ```text
//! sequence render  <timeline.json>
//! sequence compile <layout.txt>  [-o out.json]
//! sequence markers <markers.tsv> [-o out.json]
//! sequence play    <timeline.json> [--scene scene.json] [--step S] [--until T]
//! ```
//!
//! Run with: cargo run -p void_sequence_tool -- play intro.json

use clap::{Parser, Subcommand};
use log::{debug, info};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use void_sequence::{
    EventCallbacks, EventScheduler, ScenePatcher, SceneScript, SequenceConfig, SequenceError,
    Timeline,
};
use void_sequence_layout::{
    compile_layout, markers_to_timeline, parse_markers, LayoutError, LayoutTimeline,
};

/// Default playback step, one frame at 60 Hz
const DEFAULT_STEP: f64 = 1.0 / 60.0;

#[derive(Debug, Error)]
enum ToolError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Parser)]
#[command(name = "sequence", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Command {
    /// Print a timeline as a text layout
    Render {
        /// Timeline JSON file
        timeline: PathBuf,
    },

    /// Compile a text layout into timeline JSON
    Compile {
        /// Layout text file
        layout: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert an exported marker list into timeline JSON
    Markers {
        /// Tab-separated marker export
        markers: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Step through a timeline and print every dispatch
    Play {
        /// Timeline JSON file
        timeline: PathBuf,

        /// Scene script to patch alongside the timeline
        #[arg(long)]
        scene: Option<PathBuf>,

        /// Seconds between ticks
        #[arg(long, default_value_t = DEFAULT_STEP, value_parser = parse_step)]
        step: f64,

        /// Stop after this time (defaults to the timeline's end plus one step)
        #[arg(long)]
        until: Option<f64>,
    },
}

fn parse_step(raw: &str) -> Result<f64, String> {
    let step: f64 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if step.is_finite() && step > 0.0 {
        Ok(step)
    } else {
        Err(format!("step must be a positive number, got {}", step))
    }
}

fn read(path: &Path) -> Result<String, ToolError> {
    fs::read_to_string(path).map_err(|source| ToolError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write to `path`, or stdout when no path is given
fn emit(output: Option<&Path>, text: &str) -> Result<(), ToolError> {
    match output {
        Some(path) => {
            fs::write(path, text).map_err(|source| ToolError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Use a path as given when it exists, else resolve it against the base path
fn locate(config: &SequenceConfig, path: &Path) -> PathBuf {
    if path.exists() {
        path.to_path_buf()
    } else {
        config.resolve(path)
    }
}

fn run(command: Command) -> Result<(), ToolError> {
    match command {
        Command::Render { timeline } => {
            let config = SequenceConfig::load();
            let timeline = Timeline::from_path(locate(&config, &timeline))?;
            let layout = LayoutTimeline::from_timeline(&timeline)?;
            print!("{}", layout.render());
            Ok(())
        }
        Command::Compile { layout, output } => {
            let timeline = compile_layout(&read(&layout)?)?;
            info!("Compiled {} events from {}", timeline.len(), layout.display());
            emit(output.as_deref(), &timeline.to_json_string()?)
        }
        Command::Markers { markers, output } => {
            let parsed = parse_markers(&read(&markers)?)?;
            let timeline = markers_to_timeline(&parsed)?;
            info!("Imported {} events from {}", timeline.len(), markers.display());
            emit(output.as_deref(), &timeline.to_json_string()?)
        }
        Command::Play {
            timeline,
            scene,
            step,
            until,
        } => play(&timeline, scene.as_deref(), step, until),
    }
}

fn play(timeline: &Path, scene: Option<&Path>, step: f64, until: Option<f64>) -> Result<(), ToolError> {
    let config = SequenceConfig::load();
    let timeline = Timeline::from_path(locate(&config, timeline))?;

    let mut scheduler = EventScheduler::with_config(&config);
    scheduler.load(&timeline)?;

    let mut patcher = match scene {
        Some(path) => Some(ScenePatcher::from_script(&SceneScript::from_path(locate(
            &config, path,
        ))?)?),
        None => None,
    };

    let dispatched: Arc<Mutex<Vec<(String, bool, bool)>>> = Arc::default();
    let mut callbacks = EventCallbacks::new();
    for name in timeline.names() {
        let dispatched = dispatched.clone();
        let label = name.to_string();
        callbacks.insert(name, move |first, last| {
            dispatched.lock().push((label.clone(), first, last));
        });
    }

    let end = until.unwrap_or_else(|| timeline.end_time() + step);
    info!(
        "Playing {} events to {:.3}s in steps of {:.4}s",
        timeline.len(),
        end,
        step
    );

    let mut tick: u64 = 0;
    loop {
        let t = tick as f64 * step;
        if t > end {
            break;
        }

        scheduler.run(t, &mut callbacks);
        let calls = std::mem::take(&mut *dispatched.lock());
        for (name, first, last) in calls {
            println!("{:>9.3}s  {:<24} first={:<5} last={}", t, name, first, last);
        }

        if let Some(patcher) = patcher.as_mut() {
            patcher.run(t, |_, current, previous| {
                for (key, value) in current {
                    if previous.get(key) != Some(value) {
                        println!("{:>9.3}s  {} = {}", t, key, value);
                    }
                }
            });
        }

        tick += 1;
    }

    debug!("Stopped after {} ticks", tick);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
