//! Scripted run simulator.
//!
//! Issues a fresh run identifier per submission and drives a scripted
//! status/progress sequence over fixed-interval ticks, publishing on the
//! run's topic until a single terminal event.

use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::channel::EventChannel;
use crate::model::{AnalysisResult, RunId, RunStatus, SimConfig, StatusEvent};

/// Cancelable handle for one simulated run, returned by
/// [`RunSimulator::begin_run`].
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    cancelled: Arc<AtomicBool>,
}

impl RunHandle {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Stop all future publishes for this run and release its timer.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
pub struct RunSimulator {
    channel: EventChannel,
    cfg: SimConfig,
}

impl RunSimulator {
    /// `cfg` is expected to have passed [`SimConfig::validate`].
    pub fn new(channel: EventChannel, cfg: SimConfig) -> Self {
        Self { channel, cfg }
    }

    /// Start a new run. Returns synchronously with a fresh [`RunId`]; the
    /// event sequence is published from a spawned task starting one tick
    /// later, which leaves the caller room to subscribe to the topic first.
    pub fn begin_run(&self) -> RunHandle {
        let run_id = RunId::generate();
        let cancelled = Arc::new(AtomicBool::new(false));
        tokio::spawn(drive_run(
            self.channel.clone(),
            self.cfg.clone(),
            run_id.clone(),
            cancelled.clone(),
        ));
        tracing::debug!(run_id = %run_id, "run started");
        RunHandle { run_id, cancelled }
    }
}

/// Publish the scripted sequence for one run: `queued` at progress 0, then
/// `processing` ticks with monotonically growing progress, then exactly one
/// terminal event. The cancel flag is checked before every publish.
async fn drive_run(
    channel: EventChannel,
    cfg: SimConfig,
    run_id: RunId,
    cancelled: Arc<AtomicBool>,
) {
    let period = cfg.tick_interval;
    let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    ticks.tick().await;
    if cancelled.load(Ordering::Relaxed) {
        return;
    }
    channel.publish(&run_id, &StatusEvent::progressed(RunStatus::Queued, 0));

    let mut progress: u8 = 0;
    loop {
        ticks.tick().await;
        if cancelled.load(Ordering::Relaxed) {
            tracing::debug!(run_id = %run_id, "run cancelled, timer released");
            return;
        }

        let step = rand::thread_rng().gen_range(cfg.min_step..=cfg.max_step);
        progress = progress.saturating_add(step).min(100);

        if let Some(plan) = cfg.failure.as_ref() {
            if progress >= plan.at_progress {
                channel.publish(&run_id, &StatusEvent::failed(plan.message.clone()));
                tracing::debug!(run_id = %run_id, "run failed by injection");
                return;
            }
        }

        if progress < 100 {
            channel.publish(
                &run_id,
                &StatusEvent::progressed(RunStatus::Processing, progress),
            );
        } else {
            channel.publish(&run_id, &StatusEvent::succeeded(AnalysisResult::mock()));
            tracing::debug!(run_id = %run_id, "run succeeded");
            return;
        }
    }
}
