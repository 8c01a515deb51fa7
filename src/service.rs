//! Live simulation service.
//!
//! One task owns the [`Engine`]; commands, thermal ticks, and signal
//! readings all reach it as messages, so state has a single writer.
//! Signal fetches run in their own tasks and only send their result.

use std::collections::VecDeque;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::devices::room::Room;
use crate::error::SimError;
use crate::signals::{ScheduledSource, SignalError, SignalKind};
use crate::sim::commands::Command;
use crate::sim::engine::Engine;
use crate::sim::load::LoadSummary;
use crate::sim::types::{Snapshot, TickResult};

/// Tick results kept for the telemetry endpoint.
pub const MAX_HISTORY: usize = 200;

const CHANNEL_CAPACITY: usize = 64;

/// A request could not be served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The engine task is gone.
    #[error("simulation service has stopped")]
    Stopped,
    /// The engine rejected the request.
    #[error(transparent)]
    Sim(#[from] SimError),
}

enum Request {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<Snapshot, SimError>>,
    },
    Room {
        name: String,
        reply: oneshot::Sender<Result<Room, SimError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Telemetry {
        reply: oneshot::Sender<Vec<TickResult>>,
    },
    Advance(u64),
    Signal(SignalKind, Result<f64, SignalError>),
}

/// Cloneable client for a running [`Service`].
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Request>,
    load: watch::Receiver<LoadSummary>,
}

impl ServiceHandle {
    /// Applies a command and returns the state right after it.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Sim`] if the engine rejects the command,
    /// [`ServiceError::Stopped`] if the service is gone.
    pub async fn command(&self, command: Command) -> Result<Snapshot, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Command { command, reply }).await?;
        Ok(rx.await.map_err(|_| ServiceError::Stopped)??)
    }

    /// Returns a copy of the named room.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Sim`] for an unknown room.
    pub async fn room(&self, name: &str) -> Result<Room, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Room {
            name: name.to_string(),
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| ServiceError::Stopped)??)
    }

    pub async fn snapshot(&self) -> Result<Snapshot, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Snapshot { reply }).await?;
        rx.await.map_err(|_| ServiceError::Stopped)
    }

    /// The most recent tick results, oldest first, at most [`MAX_HISTORY`].
    pub async fn telemetry(&self) -> Result<Vec<TickResult>, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Telemetry { reply }).await?;
        rx.await.map_err(|_| ServiceError::Stopped)
    }

    /// Advances the engine's virtual clock by `ms`, outside the regular
    /// tick schedule.
    pub async fn advance(&self, ms: u64) -> Result<(), ServiceError> {
        self.request(Request::Advance(ms)).await
    }

    /// Hands a signal reading to the engine as if a source had fetched it.
    pub async fn ingest(
        &self,
        kind: SignalKind,
        reading: Result<f64, SignalError>,
    ) -> Result<(), ServiceError> {
        self.request(Request::Signal(kind, reading)).await
    }

    /// Receiver that sees every change of load or tariff.
    pub fn subscribe_load(&self) -> watch::Receiver<LoadSummary> {
        self.load.clone()
    }

    async fn request(&self, request: Request) -> Result<(), ServiceError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| ServiceError::Stopped)
    }
}

/// Running engine task plus its periodic tick and signal tasks.
pub struct Service {
    handle: ServiceHandle,
    tasks: Vec<JoinHandle<()>>,
    tick_ms: u64,
}

impl Service {
    /// Spawns the engine task, a thermal ticker at the engine's tick
    /// period, and one polling task per signal source.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(engine: Engine, sources: Vec<ScheduledSource>) -> Self {
        let mut service = Self::spawn_manual(engine, sources);
        let tick_ms = service.tick_ms;
        let period = Duration::from_millis(tick_ms);
        let tx = service.handle.tx.clone();
        service.tasks.push(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                ticker.tick().await;
                if tx.send(Request::Advance(tick_ms)).await.is_err() {
                    break;
                }
            }
        }));
        service
    }

    /// Like [`Service::spawn`] but without the thermal ticker; time only
    /// moves through [`ServiceHandle::advance`].
    pub fn spawn_manual(engine: Engine, sources: Vec<ScheduledSource>) -> Self {
        let tick_ms = engine.config().tick_ms;
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (load_tx, load_rx) = watch::channel(engine.load());

        let mut tasks = vec![tokio::spawn(run_engine(engine, rx, load_tx))];
        for scheduled in sources {
            tasks.push(tokio::spawn(poll_source(scheduled, tx.clone())));
        }
        info!(tasks = tasks.len(), tick_ms, "simulation service started");

        Self {
            handle: ServiceHandle { tx, load: load_rx },
            tasks,
            tick_ms,
        }
    }

    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Aborts every task and waits for them to finish.
    pub async fn shutdown(mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            let _ = task.await;
        }
        info!("simulation service stopped");
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn run_engine(
    mut engine: Engine,
    mut rx: mpsc::Receiver<Request>,
    load_tx: watch::Sender<LoadSummary>,
) {
    engine.on_load_change(move |load| {
        load_tx.send_replace(*load);
    });
    let mut history: VecDeque<TickResult> = VecDeque::with_capacity(MAX_HISTORY);

    while let Some(request) = rx.recv().await {
        match request {
            Request::Command { command, reply } => {
                let outcome = engine.apply(&command).map(|()| engine.snapshot());
                if let Err(err) = &outcome {
                    warn!(%command, error = %err, "command rejected");
                }
                let _ = reply.send(outcome);
            }
            Request::Room { name, reply } => {
                let _ = reply.send(engine.room(&name));
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(engine.snapshot());
            }
            Request::Telemetry { reply } => {
                let _ = reply.send(history.iter().cloned().collect());
            }
            Request::Advance(ms) => {
                for result in engine.advance(ms) {
                    if history.len() == MAX_HISTORY {
                        history.pop_front();
                    }
                    history.push_back(result);
                }
            }
            Request::Signal(kind, reading) => {
                engine.ingest(kind, reading);
            }
        }
    }
    debug!("engine task exiting, all handles dropped");
}

async fn poll_source(scheduled: ScheduledSource, tx: mpsc::Sender<Request>) {
    let ScheduledSource { source, every } = scheduled;
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        debug!(source = source.name(), "polling signal source");
        let reading = source.fetch().await;
        if tx.send(Request::Signal(source.kind(), reading)).await.is_err() {
            break;
        }
    }
}
