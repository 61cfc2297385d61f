//! The reconnection state machine.
//!
//! One [`Session::run`] drives connection attempts until the requested
//! operation finishes or the provider closes for good. Within an attempt a
//! single loop services provider events, finished ingestion batches and the
//! pending operation.

use std::future::Future;
use std::io::ErrorKind;
use std::pin::Pin;

use coordination::StatusRecord;
use futures::StreamExt;
use message_cache::message;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use wa_bridge::{
    ConnectionState, ConnectionUpdate, DisconnectReason, EventStream, ProviderEvent,
};

use crate::actions::{self, Operation, OperationResult};
use crate::context::SessionContext;
use crate::ingest::{ingest, IngestReport};
use crate::Result;

type PendingOperation = Pin<Box<dyn Future<Output = Result<OperationResult>> + Send>>;

/// Where the state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Pairing,
    /// Closed with "restart required"; reconnecting.
    ClosedRecoverable,
    /// Closed with "unauthorized"; device wiped, reconnecting.
    ClosedAuthInvalid,
    ClosedFatal,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The operation ran.
    Completed(OperationResult),
    /// The device needs pairing and the run may not prompt for it.
    PairingRequired,
    /// The provider closed the session for a reason that is not retried.
    Closed { status_code: Option<u16> },
}

enum Attempt {
    Reconnect,
    Done(SessionOutcome),
}

/// Split a pairing code into hyphen-joined groups of four characters.
pub fn format_pairing_code(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    chars
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// A worker's session with the provider.
#[derive(Debug)]
pub struct Session {
    ctx: SessionContext,
    history: Vec<SessionState>,
    tasks: JoinSet<IngestReport>,
    reports: Vec<IngestReport>,
}

impl Session {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            history: Vec::new(),
            tasks: JoinSet::new(),
            reports: Vec::new(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Current state; `Connecting` before the first attempt.
    pub fn state(&self) -> SessionState {
        self.history
            .last()
            .copied()
            .unwrap_or(SessionState::Connecting)
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// Reports of the ingestion batches that have finished.
    pub fn reports(&self) -> &[IngestReport] {
        &self.reports
    }

    fn enter(&mut self, state: SessionState) {
        debug!("Session state: {:?}", state);
        self.history.push(state);
    }

    /// Connect and run `operation` once the session is open, reconnecting
    /// as long as the provider asks for it.
    pub async fn run(&mut self, operation: Operation) -> Result<SessionOutcome> {
        let _ticker = self.ctx.detector.spawn_ticker(self.ctx.config.tick);
        let auth_dir = self.ctx.paths.auth_dir();

        loop {
            self.enter(SessionState::Connecting);
            info!(
                "Connecting device {} via {}",
                self.ctx.device(),
                self.ctx.provider.name()
            );

            let events = self.ctx.provider.connect(&auth_dir).await?;
            match self.drive(events, &operation).await? {
                Attempt::Reconnect => continue,
                Attempt::Done(outcome) => return Ok(outcome),
            }
        }
    }

    /// Wait for every in-flight ingestion batch.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            self.record(joined);
        }
    }

    fn record(&mut self, joined: std::result::Result<IngestReport, tokio::task::JoinError>) {
        match joined {
            Ok(report) => self.reports.push(report),
            Err(e) => error!("Ingestion task failed: {}", e),
        }
    }

    async fn drive(&mut self, mut events: EventStream, operation: &Operation) -> Result<Attempt> {
        let mut pending: Option<PendingOperation> = None;
        let mut pairing_requested = false;

        loop {
            tokio::select! {
                result = poll_pending(&mut pending) => {
                    let result = result?;
                    info!("Operation finished with {}", result.message);
                    return Ok(Attempt::Done(SessionOutcome::Completed(result)));
                }
                Some(joined) = self.tasks.join_next() => {
                    self.record(joined);
                }
                event = events.next() => match event {
                    Some(Ok(event)) => {
                        let step = self
                            .handle(event, operation, &mut pending, &mut pairing_requested)
                            .await?;
                        if let Some(step) = step {
                            return Ok(step);
                        }
                    }
                    Some(Err(e)) => warn!("Provider event error: {}", e),
                    None => {
                        warn!("Provider event stream ended");
                        self.enter(SessionState::ClosedFatal);
                        return Ok(Attempt::Done(SessionOutcome::Closed { status_code: None }));
                    }
                },
            }
        }
    }

    async fn handle(
        &mut self,
        event: ProviderEvent,
        operation: &Operation,
        pending: &mut Option<PendingOperation>,
        pairing_requested: &mut bool,
    ) -> Result<Option<Attempt>> {
        let update = match event {
            ProviderEvent::Connection(update) => update,
            ProviderEvent::HistorySet(batch)
            | ProviderEvent::MessagesUpsert(batch)
            | ProviderEvent::ChatsUpsert(batch) => {
                self.ctx.detector.reset();
                if !batch.is_empty() {
                    debug!("Queueing batch of {} messages", batch.len());
                    let ctx = self.ctx.clone();
                    self.tasks.spawn(async move { ingest(&ctx, &batch).await });
                }
                return Ok(None);
            }
        };

        if update.qr.is_some() {
            if let Some(outcome) = self.on_pairing(pairing_requested).await? {
                return Ok(Some(Attempt::Done(outcome)));
            }
        }

        match update.connection {
            Some(ConnectionState::Open) => {
                self.enter(SessionState::Open);
                info!("Connection open for {}", self.ctx.device());
                if pending.is_none() {
                    let ctx = self.ctx.clone();
                    *pending = Some(Box::pin(actions::execute(ctx, operation.clone())));
                }
                Ok(None)
            }
            Some(ConnectionState::Close) => {
                // The operation restarts on the next open. Dropping it here
                // releases any db lock it holds before the wipe takes it.
                if pending.take().is_some() {
                    debug!("Abandoning the pending operation on close");
                }
                self.on_close(&update).await.map(Some)
            }
            Some(ConnectionState::Connecting) | None => Ok(None),
        }
    }

    async fn on_pairing(&mut self, requested: &mut bool) -> Result<Option<SessionOutcome>> {
        self.enter(SessionState::Pairing);
        self.ctx.mark_first_run();
        self.ctx.detector.raise_threshold();

        if self.ctx.config.automation {
            warn!(
                "Device {} is not paired and automation mode forbids pairing",
                self.ctx.device()
            );
            return Ok(Some(SessionOutcome::PairingRequired));
        }

        if !*requested {
            let code = self
                .ctx
                .provider
                .request_pairing_code(self.ctx.device())
                .await?;
            let code = format_pairing_code(&code);
            info!("Pairing code for {}: {}", self.ctx.device(), code);
            self.ctx
                .publish(&StatusRecord::pairing_code_required(code))?;
            *requested = true;
        }
        Ok(None)
    }

    async fn on_close(&mut self, update: &ConnectionUpdate) -> Result<Attempt> {
        match update.disconnect_reason() {
            DisconnectReason::RestartRequired => {
                info!("Provider requested a restart; reconnecting");
                self.enter(SessionState::ClosedRecoverable);
                self.ctx.detector.restore_threshold();
                Ok(Attempt::Reconnect)
            }
            DisconnectReason::Unauthorized => {
                warn!(
                    "Session for {} is no longer authorized; wiping device",
                    self.ctx.device()
                );
                self.enter(SessionState::ClosedAuthInvalid);
                self.wipe_device().await?;
                Ok(Attempt::Reconnect)
            }
            DisconnectReason::Other(status_code) => {
                warn!("Connection closed (status {:?})", status_code);
                self.enter(SessionState::ClosedFatal);
                Ok(Attempt::Done(SessionOutcome::Closed { status_code }))
            }
        }
    }

    /// Remove auth material and every cached message.
    async fn wipe_device(&mut self) -> Result<()> {
        self.drain().await;
        let _lock = self.ctx.db_lock.acquire(self.ctx.config.tick).await;

        match tokio::fs::remove_dir_all(self.ctx.paths.auth_dir()).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let purged = message::purge_all(self.ctx.db.pool()).await?;
        info!("Removed auth material and {} cached messages", purged);
        Ok(())
    }
}

async fn poll_pending(pending: &mut Option<PendingOperation>) -> Result<OperationResult> {
    match pending {
        Some(operation) => operation.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pairing_code() {
        assert_eq!(format_pairing_code("ABCD1234"), "ABCD-1234");
        assert_eq!(format_pairing_code("ABCDEFGHIJ"), "ABCD-EFGH-IJ");
        assert_eq!(format_pairing_code(""), "");
    }
}
