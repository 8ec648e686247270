// SPDX-License-Identifier: GPL-3.0-only

//! Async runtime for a capture session
//!
//! One tokio task owns the [`CaptureSession`]. UI commands and timer
//! expirations arrive on the same channel, so state changes are strictly
//! serialized. Timers are plain `tokio::time::sleep` tasks that post the
//! epoch they were issued with; the state machine drops stale ones.
//!
//! Commands that reach the video source (opening it, grabbing and
//! filtering a shot, releasing it) move the session onto the blocking pool
//! and hand it back when done. Nothing else runs until it returns.
//!
//! Snapshots are published on a `watch` channel after every command.

use super::{CaptureSession, SessionEffect, SessionSnapshot};
use crate::constants::{CountdownSetting, timing};
use crate::errors::SessionError;
use crate::pipelines::photo::Photo;
use futures::channel::oneshot;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tracing::{debug, error, info};
use uuid::Uuid;

type Reply<T> = oneshot::Sender<T>;

/// Messages handled by the session actor
#[derive(Debug)]
enum Command {
    StartCamera,
    Stop,
    StartCapture,
    SelectLayout(String, Reply<Result<(), SessionError>>),
    SelectFilter(String),
    SetCountdown(CountdownSetting),
    Retake(usize, Reply<Result<(), SessionError>>),
    ResetAll,
    Photos(Reply<Vec<Photo>>),
    TakePhotos(Reply<Vec<Photo>>),
    Shutdown,
    // Timer expirations
    ReadyPoll(u64),
    StartTimeout(u64),
    Tick(u64),
}

impl Command {
    /// Whether handling may block on the video source or the photo pipeline
    ///
    /// A poll or timeout can fail the camera, and failing releases the source.
    fn may_block(&self) -> bool {
        matches!(
            self,
            Command::StartCamera
                | Command::Stop
                | Command::Shutdown
                | Command::ReadyPoll(_)
                | Command::StartTimeout(_)
                | Command::Tick(_)
        )
    }
}

/// Session actor
pub struct SessionDriver {
    session: CaptureSession,
    commands: mpsc::Receiver<Command>,
    timers: mpsc::WeakSender<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionDriver {
    /// Spawn the actor on the current tokio runtime
    pub fn spawn(session: CaptureSession) -> SessionHandle {
        let (tx, rx) = mpsc::channel(timing::SESSION_COMMAND_QUEUE);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        info!(session = %session.id(), "Starting session driver");

        let driver = SessionDriver {
            session,
            commands: rx,
            timers: tx.downgrade(),
            snapshots: snapshot_tx,
        };
        tokio::spawn(driver.run());

        SessionHandle {
            commands: tx,
            snapshots: snapshot_rx,
        }
    }

    async fn run(self) {
        let SessionDriver {
            mut session,
            mut commands,
            timers,
            snapshots,
        } = self;
        let id = session.id();

        while let Some(command) = commands.recv().await {
            let shutdown = matches!(command, Command::Shutdown);
            let (next, effects) = match dispatch(session, command).await {
                Ok(done) => done,
                Err(e) => {
                    // The session was dropped with the failed task, which releases the source
                    error!(session = %id, error = %e, "Session task failed");
                    return;
                }
            };
            session = next;
            for effect in effects {
                schedule(id, &timers, effect);
            }
            snapshots.send_replace(session.snapshot());
            if shutdown {
                break;
            }
        }
        drop(commands);

        match dispatch(session, Command::Stop).await {
            Ok((session, _)) => {
                snapshots.send_replace(session.snapshot());
            }
            Err(e) => error!(session = %id, error = %e, "Session task failed while stopping"),
        }
        info!(session = %id, "Session driver stopped");
    }
}

/// Apply `command` to the session, on the blocking pool when it may block
async fn dispatch(
    mut session: CaptureSession,
    command: Command,
) -> Result<(CaptureSession, Vec<SessionEffect>), JoinError> {
    if !command.may_block() {
        let effects = apply(&mut session, command);
        return Ok((session, effects));
    }
    tokio::task::spawn_blocking(move || {
        let effects = apply(&mut session, command);
        (session, effects)
    })
    .await
}

fn apply(session: &mut CaptureSession, command: Command) -> Vec<SessionEffect> {
    match command {
        Command::StartCamera => session.start_camera(),
        Command::Stop | Command::Shutdown => {
            session.stop();
            Vec::new()
        }
        Command::StartCapture => session.start_capture(),
        Command::SelectLayout(id, reply) => {
            let _ = reply.send(session.select_layout(&id));
            Vec::new()
        }
        Command::SelectFilter(id) => {
            session.select_filter(&id);
            Vec::new()
        }
        Command::SetCountdown(setting) => {
            session.set_countdown(setting);
            Vec::new()
        }
        Command::Retake(position, reply) => {
            let _ = reply.send(session.retake(position));
            Vec::new()
        }
        Command::ResetAll => {
            session.reset_all();
            Vec::new()
        }
        Command::Photos(reply) => {
            let _ = reply.send(session.photos().to_vec());
            Vec::new()
        }
        Command::TakePhotos(reply) => {
            let _ = reply.send(session.take_photos());
            Vec::new()
        }
        Command::ReadyPoll(epoch) => session.poll_ready(epoch),
        Command::StartTimeout(epoch) => session.on_start_timeout(epoch),
        Command::Tick(epoch) => session.on_tick(epoch),
    }
}

fn schedule(id: Uuid, timers: &mpsc::WeakSender<Command>, effect: SessionEffect) {
    let (after, command) = match effect {
        SessionEffect::ScheduleReadyPoll { epoch, after } => (after, Command::ReadyPoll(epoch)),
        SessionEffect::ScheduleStartTimeout { epoch, after } => {
            (after, Command::StartTimeout(epoch))
        }
        SessionEffect::ScheduleTick { epoch, after } => (after, Command::Tick(epoch)),
        SessionEffect::Captured { index } => {
            debug!(session = %id, index, "Capture announced");
            return;
        }
        SessionEffect::Completed => {
            info!(session = %id, "All photos captured");
            return;
        }
    };
    delay_command(timers.clone(), after, command);
}

/// Post `command` back to the actor after `after`
///
/// Holds only a weak sender so pending timers never keep the actor alive.
fn delay_command(timers: mpsc::WeakSender<Command>, after: Duration, command: Command) {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Some(tx) = timers.upgrade() {
            let _ = tx.send(command).await;
        }
    });
}

/// Cloneable handle to a running session actor
///
/// Dropping every handle stops the actor and releases the video source.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::SessionClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx)).await?;
        rx.await.map_err(|_| SessionError::SessionClosed)
    }

    pub async fn start_camera(&self) -> Result<(), SessionError> {
        self.send(Command::StartCamera).await
    }

    pub async fn stop(&self) -> Result<(), SessionError> {
        self.send(Command::Stop).await
    }

    pub async fn start_capture(&self) -> Result<(), SessionError> {
        self.send(Command::StartCapture).await
    }

    pub async fn select_layout(&self, id: &str) -> Result<(), SessionError> {
        let id = id.to_string();
        self.request(|reply| Command::SelectLayout(id, reply)).await?
    }

    pub async fn select_filter(&self, id: &str) -> Result<(), SessionError> {
        self.send(Command::SelectFilter(id.to_string())).await
    }

    pub async fn set_countdown(&self, setting: CountdownSetting) -> Result<(), SessionError> {
        self.send(Command::SetCountdown(setting)).await
    }

    /// Remove the photo at `position` in capture order
    pub async fn retake(&self, position: usize) -> Result<(), SessionError> {
        self.request(|reply| Command::Retake(position, reply)).await?
    }

    pub async fn reset_all(&self) -> Result<(), SessionError> {
        self.send(Command::ResetAll).await
    }

    /// Copy of the captured photos
    pub async fn photos(&self) -> Result<Vec<Photo>, SessionError> {
        self.request(Command::Photos).await
    }

    /// Move the captured photos out of the session
    pub async fn take_photos(&self) -> Result<Vec<Photo>, SessionError> {
        self.request(Command::TakePhotos).await
    }

    /// Stop the actor and release the source
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(Command::Shutdown).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        Ok(snapshot.clone())
    }
}
