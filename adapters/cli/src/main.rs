#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads a survey scenario and replays its route.

mod scenario;

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use survey_rendering::{render_replay, ReplayMode, TextCanvas, WriterPresenter};
use survey_system_mission::{CommitOutcome, MissionManager};
use survey_system_replay::{replay, summarize, CoverageSummary};
use survey_world::GridMap;
use tracing_subscriber::EnvFilter;

use crate::scenario::{Scenario, ScriptedPlanner};

const DEFAULT_PACE_MS: u64 = 150;

#[derive(Debug, Parser)]
#[command(name = "survey", about = "Replays a surveillance route over a grid map")]
struct CliArgs {
    /// Path to the TOML scenario describing the map, agent and route.
    scenario: PathBuf,
    /// Draws one frame per step instead of only the finished trajectory.
    #[arg(long)]
    animate: bool,
    /// Pause between animated frames in milliseconds.
    #[arg(long, value_name = "MS")]
    pace_ms: Option<u64>,
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
    /// Prints the coverage summary without drawing the map.
    #[arg(long)]
    summary_only: bool,
}

/// Entry point for the survey command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_level)?;

    let scenario = Scenario::load(&args.scenario)?;
    let mut manager: MissionManager<Arc<GridMap>, ScriptedPlanner> = MissionManager::new();
    manager.set_map(Arc::new(scenario.grid_map()?));
    manager
        .set_agent(scenario.agent())
        .context("scenario agent cannot be placed")?;
    manager.set_router(scenario.planner()?)?;
    let _ = manager.run_planner()?;
    if let CommitOutcome::Incomplete { missing } = manager.commit() {
        anyhow::bail!("scenario mission is missing its {missing}");
    }

    let inputs = manager
        .state()
        .replay_inputs()
        .context("committed mission has no replay inputs")?;
    tracing::info!(
        start = %inputs.start,
        moves = inputs.route.len(),
        "replaying scenario"
    );

    let stdout = io::stdout();
    if !args.summary_only {
        let mode = if args.animate {
            let pace = args
                .pace_ms
                .map(Duration::from_millis)
                .or_else(|| scenario.pace())
                .unwrap_or(Duration::from_millis(DEFAULT_PACE_MS));
            ReplayMode::Animated { pace }
        } else {
            ReplayMode::Instant
        };

        let mut canvas = TextCanvas::from_map(inputs.map);
        canvas.place_agent(inputs.start);
        let mut presenter = WriterPresenter::new(stdout.lock());
        let _ = render_replay(
            &mut canvas,
            replay(inputs.start, inputs.route, inputs.map),
            &mut presenter,
            mode,
        )?;
    }

    let summary = summarize(inputs.start, inputs.route, inputs.map)?;
    print_summary(&mut stdout.lock(), &summary).context("failed to write coverage summary")
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level `{level}`"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn print_summary<W: Write>(out: &mut W, summary: &CoverageSummary) -> io::Result<()> {
    writeln!(out, "moves: {}", summary.moves)?;
    writeln!(out, "final pose: {}", summary.final_pose)?;
    writeln!(
        out,
        "coverage: {}/{} cells ({:.1}%)",
        summary.covered_count(),
        summary.traversable_cells,
        summary.coverage_ratio() * 100.0
    )?;
    writeln!(
        out,
        "closed loop: {}",
        if summary.closed_loop { "yes" } else { "no" }
    )
}
