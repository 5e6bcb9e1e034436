//! Tokio adapter driving an `ActionSession`.
//!
//! The session itself is synchronous and clock-agnostic: it only records idle
//! deadlines. `SessionDriver` owns the session and its host, receives
//! `DriverCommand`s from the entry layer, stamps notifications with the
//! runtime clock, and sleeps until the pending idle deadline. Decisive
//! outcomes (resolutions, discards, errors) go out as `DriverReport`s.
//!
//! Hooks are not `Send`, so the driver runs on the task that awaits it
//! (`tokio::join!` / `LocalSet`), never through `tokio::spawn`.

pub mod logging;

use core_events::Notification;
use core_session::{ActionSession, Resolution, SessionError, SessionResult};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const COMMAND_CHANNEL_CAP: usize = 64;

#[derive(Debug, Clone)]
pub enum DriverCommand {
    Trigger(Notification),
    Refresh(Notification),
    SetDelay(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverReport {
    /// `Resolved` or `Discarded`; open and ignored outcomes are not reported.
    Outcome(Resolution),
    Failed {
        handler: Option<String>,
        message: String,
    },
}

impl DriverReport {
    fn from_error(err: &SessionError) -> Self {
        DriverReport::Failed {
            handler: err.handler().map(str::to_string),
            message: err.to_string(),
        }
    }
}

enum Wake {
    Command(Option<DriverCommand>),
    Idle,
}

pub struct SessionDriver<H, S: Default> {
    session: ActionSession<H, S>,
    host: H,
    commands: mpsc::Receiver<DriverCommand>,
    reports: mpsc::Sender<DriverReport>,
}

impl<H, S: Default> SessionDriver<H, S> {
    pub fn new(
        session: ActionSession<H, S>,
        host: H,
        commands: mpsc::Receiver<DriverCommand>,
        reports: mpsc::Sender<DriverReport>,
    ) -> Self {
        Self {
            session,
            host,
            commands,
            reports,
        }
    }

    /// Driver plus the command sender and report receiver wired to it.
    pub fn channel(
        session: ActionSession<H, S>,
        host: H,
    ) -> (
        Self,
        mpsc::Sender<DriverCommand>,
        mpsc::Receiver<DriverReport>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAP);
        let (report_tx, report_rx) = mpsc::channel(COMMAND_CHANNEL_CAP);
        (Self::new(session, host, cmd_rx, report_tx), cmd_tx, report_rx)
    }

    pub fn session(&self) -> &ActionSession<H, S> {
        &self.session
    }

    /// Run until every command sender is dropped; returns the host.
    pub async fn run(mut self) -> H {
        info!(target: "ime.runtime", "driver_started");
        loop {
            let deadline = self.session.idle_deadline().map(Instant::from_std);
            let sleep_at = deadline.unwrap_or_else(Instant::now);
            let wake = tokio::select! {
                biased;
                cmd = self.commands.recv() => Wake::Command(cmd),
                _ = tokio::time::sleep_until(sleep_at), if deadline.is_some() => Wake::Idle,
            };
            match wake {
                Wake::Command(Some(cmd)) => self.handle(cmd).await,
                Wake::Command(None) => break,
                Wake::Idle => {
                    let now = Instant::now().into_std();
                    let result = self.session.poll_idle(now, &mut self.host);
                    self.report(result).await;
                }
            }
        }
        let metrics = self.session.metrics();
        info!(
            target: "ime.runtime",
            bursts = metrics.bursts_started,
            resolved = metrics.resolved(),
            discarded = metrics.discarded,
            hook_errors = metrics.hook_errors,
            "driver_stopped"
        );
        self.host
    }

    async fn handle(&mut self, cmd: DriverCommand) {
        let now = Instant::now().into_std();
        match cmd {
            DriverCommand::Trigger(notification) => {
                let result = self.session.trigger(notification.at(now), &mut self.host);
                self.report(result).await;
            }
            DriverCommand::Refresh(notification) => {
                let resolution = self.session.refresh(notification.at(now));
                self.report(Ok(resolution)).await;
            }
            DriverCommand::SetDelay(delay) => {
                if let Err(err) = self.session.set_delay(delay) {
                    self.send(DriverReport::from_error(&err)).await;
                }
            }
        }
    }

    async fn report(&mut self, result: SessionResult<Resolution>) {
        match result {
            Ok(resolution @ (Resolution::Resolved(_) | Resolution::Discarded)) => {
                self.send(DriverReport::Outcome(resolution)).await;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(target: "ime.runtime", error = %err, "session_error");
                self.send(DriverReport::from_error(&err)).await;
            }
        }
    }

    async fn send(&mut self, report: DriverReport) {
        if self.reports.send(report).await.is_err() {
            debug!(target: "ime.runtime", "report_receiver_dropped");
        }
    }
}
