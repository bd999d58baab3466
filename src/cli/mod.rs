// src/cli/mod.rs
//
// Command-line interface: builds the source and engine from the arguments,
// drives the tick loop and collects the session report.

mod args;
mod output;

pub use args::{Args, InputKind};
pub use output::{
    describe_correlation, describe_pan, format_json, format_meter, print_json, print_summary,
    SessionReport,
};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::iter::Take;
use std::ops::ControlFlow;
use std::time::Duration;

use crate::config::ScopeConfig;
use crate::core::decoder::decode_stereo;
use crate::core::frame::StereoSample;
use crate::core::scheduler::{self, TickStats, Ticker};
use crate::core::source::{
    AudioSource, ClipSource, LiveSource, NullSource, StreamSource, ToneSpec, ToneStream,
};
use crate::core::VisualizationEngine;

/// Per-tick processing allowance
pub const TICK_BUDGET: Duration = Duration::from_millis(3);

const DEFAULT_TONE_SECS: f64 = 2.0;
const DEFAULT_SILENT_SECS: f64 = 1.0;

/// Frames to play and where they came from
struct Program {
    name: String,
    feed: Feed,
    duration: f64,
}

enum Feed {
    Silent,
    /// Decoded file, already in memory
    Clip(Vec<StereoSample>),
    /// Synthesised block by block as the session pulls
    Tone(Take<ToneStream>),
}

/// Run a scope session and return its report.
///
/// Output files are written here; printing the report is left to the caller.
pub fn run(args: &Args) -> Result<SessionReport> {
    let mut config = match &args.config {
        Some(path) => ScopeConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ScopeConfig::default(),
    };

    let program = load_program(args, &mut config)?;
    info!(
        "session start: {} for {:.2}s ({}, gain {})",
        program.name,
        program.duration,
        if args.realtime { "realtime" } else { "offline" },
        args.gain
    );

    let mut engine = VisualizationEngine::new(config.clone(), args.gain)
        .context("Invalid scope configuration")?;

    let report = if args.realtime {
        run_realtime(&mut engine, program, &config)?
    } else {
        run_offline(&mut engine, program, &config, !args.json)?
    };

    if let Some(path) = &args.snapshot {
        engine
            .frame()
            .render()
            .save(path)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        info!("snapshot written to {}", path.display());
    }
    if let Some(path) = &args.raw_snapshot {
        engine
            .density()
            .save_png(path)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        info!("phosphor layer written to {}", path.display());
    }

    info!("session end after {} ticks", report.ticks);
    Ok(report)
}

fn load_program(args: &Args, config: &mut ScopeConfig) -> Result<Program> {
    match args.input_kind() {
        InputKind::Silent => Ok(Program {
            name: NullSource.name().to_string(),
            feed: Feed::Silent,
            duration: args.duration.unwrap_or(DEFAULT_SILENT_SECS),
        }),
        InputKind::File(path) => {
            let clip = decode_stereo(&path)?;
            config.sample_rate = clip.sample_rate;
            let duration = args
                .duration
                .map_or(clip.duration_secs, |d| d.min(clip.duration_secs));
            Ok(Program {
                name: path.display().to_string(),
                feed: Feed::Clip(clip.frames),
                duration,
            })
        }
        InputKind::Tone(kind) => {
            let duration = args.duration.unwrap_or(DEFAULT_TONE_SECS);
            let spec = ToneSpec::new(kind, config.sample_rate)
                .frequency(args.frequency)
                .amplitude(args.amplitude)
                .pan(args.pan);
            // Saturates for absurd durations; the stream is never collected
            let frames = (duration * config.sample_rate as f64).ceil() as usize;
            Ok(Program {
                name: format!("tone: {}", kind),
                feed: Feed::Tone(spec.stream().take(frames)),
                duration,
            })
        }
    }
}

/// Simulated clock: one block per tick, as fast as the machine allows
fn run_offline(
    engine: &mut VisualizationEngine,
    program: Program,
    config: &ScopeConfig,
    show_progress: bool,
) -> Result<SessionReport> {
    let mut source: Box<dyn AudioSource> = match program.feed {
        Feed::Clip(frames) => Box::new(ClipSource::new(program.name.clone(), frames)),
        Feed::Tone(stream) => Box::new(StreamSource::new(program.name.clone(), stream)),
        Feed::Silent => Box::new(NullSource),
    };

    let block_secs = config.block_duration();
    let total_ticks = (program.duration / block_secs).ceil().max(1.0) as u64;

    let progress = if show_progress {
        let pb = ProgressBar::new(total_ticks);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ticks")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut stats = TickStats::new(TICK_BUDGET);
    let mut counters = Counters::default();
    let mut block = Vec::with_capacity(config.block_frames);

    for i in 0..total_ticks {
        if scheduler::is_shutdown_requested() {
            warn!("interrupted after {} ticks", i);
            break;
        }

        let t_prev = i as f64 * block_secs;
        let t_now = t_prev + block_secs;

        block.clear();
        if let Err(e) = source.pull(config.block_frames, &mut block) {
            counters.failure(&e);
            block.clear();
        }
        counters.frames += block.len() as u64;

        stats.time(|| {
            engine.tick(&block, t_prev, t_now);
        });
        progress.inc(1);
    }
    progress.finish_and_clear();

    let overruns = source.overruns();
    Ok(build_report(
        engine,
        &program.name,
        "offline",
        stats.ticks as f64 * block_secs,
        &stats,
        &counters,
        overruns,
    ))
}

/// Wall clock: a driver thread plays the frames while the scheduler ticks
fn run_realtime(
    engine: &mut VisualizationEngine,
    program: Program,
    config: &ScopeConfig,
) -> Result<SessionReport> {
    let mut source: Box<dyn AudioSource> = match program.feed {
        Feed::Clip(frames) => Box::new(
            LiveSource::spawn(program.name.clone(), frames.into_iter(), config)
                .context("Failed to start playback thread")?,
        ),
        Feed::Tone(stream) => Box::new(
            LiveSource::spawn(program.name.clone(), stream, config)
                .context("Failed to start playback thread")?,
        ),
        Feed::Silent => Box::new(NullSource),
    };

    let mut stats = TickStats::new(TICK_BUDGET);
    let mut counters = Counters::default();
    let mut ticker = Ticker::new(config.tick_interval, scheduler::shutdown_flag());

    ticker.run(|now| {
        let ingested = stats.time(|| {
            let (frame, failure) = engine.poll(source.as_mut(), now);
            if let Some(e) = &failure {
                counters.failure(e);
            }
            frame.ingested
        });
        counters.frames += ingested as u64;

        let drained = source.is_exhausted() && engine.window().is_empty();
        if now >= program.duration || drained {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    if scheduler::is_shutdown_requested() {
        warn!("interrupted after {} ticks", ticker.ticks());
    }

    let overruns = source.overruns();
    // Stops and joins the playback thread before reporting
    drop(source);

    Ok(build_report(
        engine,
        &program.name,
        "realtime",
        ticker.elapsed(),
        &stats,
        &counters,
        overruns,
    ))
}

#[derive(Debug, Default)]
struct Counters {
    frames: u64,
    failures: u64,
}

impl Counters {
    fn failure(&mut self, e: &crate::error::ScopeError) {
        // First failure at warn, the rest at debug
        if self.failures == 0 {
            warn!("{}", e);
        } else {
            debug!("{}", e);
        }
        self.failures += 1;
    }
}

fn build_report(
    engine: &VisualizationEngine,
    source: &str,
    mode: &str,
    duration_secs: f64,
    stats: &TickStats,
    counters: &Counters,
    overruns: u64,
) -> SessionReport {
    let frame = engine.frame();
    SessionReport {
        source: source.to_string(),
        mode: mode.to_string(),
        duration_secs,
        ticks: stats.ticks,
        frames_ingested: counters.frames,
        pull_failures: counters.failures,
        overruns,
        mean_tick_us: stats.mean_us(),
        max_tick_us: stats.max_us(),
        tick_budget_us: stats.budget().as_secs_f64() * 1e6,
        over_budget_ticks: stats.over_budget,
        correlation: frame.correlation,
        pan: frame.pan,
        gain_label: frame.gain_label.to_string(),
        gain_db: frame.gain_db,
    }
}
