//! Headless scenario runs with signal sources polled on the virtual clock.

use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::debug;

use crate::config::ScenarioConfig;
use crate::signals::ScheduledSource;
use crate::sim::engine::Engine;
use crate::sim::report::RunReport;
use crate::sim::types::TickResult;

/// Trajectory and summary of one headless run.
pub struct RunOutput {
    pub results: Vec<TickResult>,
    pub report: RunReport,
}

struct Poll {
    scheduled: ScheduledSource,
    every_ms: u64,
    next_due_ms: u64,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Runs `scenario.simulation.ticks` ticks of its script on `engine`.
///
/// Each source is polled once before the first tick and then whenever its
/// period has elapsed on the engine's virtual clock, so a drifting weather
/// source replays identically for the same seed. Fetches are driven to
/// completion on `rt` before the tick proceeds.
pub fn run_headless(
    engine: &mut Engine,
    scenario: &ScenarioConfig,
    sources: Vec<ScheduledSource>,
    rt: &Runtime,
) -> RunOutput {
    let mut polls: Vec<Poll> = sources
        .into_iter()
        .map(|scheduled| Poll {
            every_ms: millis(scheduled.every),
            next_due_ms: engine.elapsed_ms(),
            scheduled,
        })
        .collect();

    let results = engine.run_script_with(
        scenario.simulation.ticks,
        &scenario.script,
        |engine, tick| {
            let now = engine.elapsed_ms();
            for poll in polls.iter_mut().filter(|p| p.next_due_ms <= now) {
                let source = &poll.scheduled.source;
                debug!(tick, source = source.name(), "polling signal source");
                let reading = rt.block_on(source.fetch());
                engine.ingest(source.kind(), reading);
                poll.next_due_ms = now.saturating_add(poll.every_ms);
            }
        },
    );

    let report = RunReport::from_results(
        &results,
        engine.config().tick_hours(),
        scenario.simulation.comfort_target_c,
    );
    RunOutput { results, report }
}
