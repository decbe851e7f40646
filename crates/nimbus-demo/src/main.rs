//! Headless demo that drives a synthetic workload through the performance layer.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p nimbus-demo -- --entities 2000 --frames 1200`.

mod workload;

use std::time::Instant;

use clap::Parser;
use nimbus_config::{CliArgs, Config};
use nimbus_perf::{FrameTick, LoadTransition, PerfError, PerformanceLayer};
use tracing::info;

use crate::workload::Workload;

/// Nominal frame length of the simulated host loop.
const TARGET_DT: f32 = 1.0 / 60.0;

fn main() -> Result<(), PerfError> {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .unwrap_or_else(nimbus_config::default_config_dir);

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    nimbus_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    config.validate()?;

    let mut layer = PerformanceLayer::from_config(&config)?;
    if args.emergency {
        layer.enable_emergency_mode();
    }

    let mut workload = Workload::spawn(&mut layer, config.spatial.world, args.entities, args.seed);
    info!(
        "Running {} frames with {} actors (seed {})",
        args.frames, args.entities, args.seed
    );

    let stats_every = u64::from(config.debug.log_stats_every_frames);
    let started = Instant::now();
    let mut tick = FrameTick::new(0.0, TARGET_DT);
    let mut rebuilds = 0u64;

    for frame in 0..args.frames {
        let frame_start = Instant::now();
        workload.step(&mut layer, TARGET_DT);

        if stats_every > 0 && frame % stats_every == 0 {
            let stats = layer.stats();
            let (projectiles, effects) = workload.in_flight();
            info!(
                frame = stats.frame,
                indexed = stats.indexed_count,
                depth = stats.tree_depth,
                pool_active = stats.pool_active,
                pool_free = stats.pool_free,
                culled = stats.culled_count,
                simplified = stats.simplified_count,
                emergency = stats.emergency,
                projectiles,
                effects,
                "perf stats"
            );
        }

        // Report the real cost of the frame, never less than the nominal step.
        let frame_time = frame_start.elapsed().as_secs_f32().max(TARGET_DT);
        let report = layer.tick(&FrameTick::new(tick.time, frame_time));
        rebuilds += u64::from(report.rebuilt);
        match report.transition {
            Some(LoadTransition::Overloaded) => info!("Frame {frame}: load monitor overloaded"),
            Some(LoadTransition::Recovered) => info!("Frame {frame}: load monitor recovered"),
            None => {}
        }
        tick = tick.advance(frame_time);
    }

    let totals = workload.totals();
    info!(
        "Done in {:.2?}: {} fired, {} hits, {} skipped actor updates, {} culled effects, {} rebuilds",
        started.elapsed(),
        totals.fired,
        totals.hits,
        totals.skipped_updates,
        totals.culled_effects,
        rebuilds
    );

    workload.despawn_transients(&mut layer);
    layer.shutdown();
    Ok(())
}
