//! Per-device session state machine and the shared loop driver.
//!
//! A session moves through `Uninitialised -> Running -> Stopped`, never
//! backwards. The loop driver is the same for every device kind; variants
//! only provide the `before_loop`/`loop_event`/`after_loop` hooks. Any error
//! out of `loop_event` stops the loop and tears the session down; nothing
//! escalates past the session boundary.

use std::{net::IpAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::watch,
    time::{self, Instant},
};

use crate::{registry::Registry, relay::RelayConnection, MuxdError, Result};

pub mod net;
pub mod usb;
pub use net::NetworkDevice;
pub use usb::UsbDevice;

/// Idle interval between control-service probes when no heartbeat channel is
/// available.
pub const IDLE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Usb,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialised,
    Running,
    Stopped,
}

/// Shared view of a running session: identity, loop state and the relay
/// entry point. Stored in the [`Registry`] and handed to callers; the
/// session's own resources stay with the driver task.
#[derive(Debug)]
pub struct SessionHandle {
    serial: String,
    kind: TransportKind,
    addr: Option<IpAddr>,
    state: watch::Sender<LoopState>,
}

impl SessionHandle {
    pub(crate) fn new(serial: &str, kind: TransportKind, addr: Option<IpAddr>) -> Arc<Self> {
        let (state, _) = watch::channel(LoopState::Uninitialised);
        Arc::new(SessionHandle {
            serial: serial.to_string(),
            kind,
            addr,
            state,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Network address of the device, if it has one.
    pub fn addr(&self) -> Option<IpAddr> {
        self.addr
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Watches loop-state transitions. The receiver only retains the latest
    /// value.
    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Cancels the session loop. Idempotent; the driver observes the change
    /// before its next iteration and runs the teardown hook exactly once.
    pub fn stop(&self) {
        self.state.send_replace(LoopState::Stopped);
    }

    /// Moves the state from `from` to `to`, returning whether the transition
    /// took place. Keeps the `Uninitialised -> Running -> Stopped` sequence
    /// honest when a session is stopped before its driver ever ran.
    fn advance(&self, from: LoopState, to: LoopState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// Waits until `timeout` elapses or the loop state leaves `Running`,
    /// whichever comes first. The predicate is re-checked on every wake, so a
    /// spurious notification never ends the wait early and an external
    /// `stop` always does.
    pub async fn wait_for_timeout(&self, timeout: Duration) {
        let mut state = self.state.subscribe();
        let deadline = Instant::now() + timeout;
        while *state.borrow_and_update() == LoopState::Running {
            match time::timeout_at(deadline, state.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) | Err(_) => break,
            }
        }
    }

    /// Bridges `client` to the given service port on this device. The relay
    /// manages its own lifetime from here on; failures are reported to the
    /// caller and touch no session state.
    pub async fn start_connect<C>(&self, port: u16, client: C) -> Result<()>
    where
        C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let addr = self
            .addr
            .ok_or_else(|| MuxdError::RelayUnsupported(self.serial.clone()))?;

        log::info!("[{}] connect request for {}:{}", self.serial, addr, port);
        RelayConnection::new(addr, port, client).establish().await
    }
}

/// Capability interface implemented by each device kind. The same driver
/// runs every variant; hooks must not outlive their session task.
#[async_trait]
pub trait DeviceSession: Send + 'static {
    fn handle(&self) -> &Arc<SessionHandle>;

    /// One-time warm-up before the first iteration. Must not perform any
    /// cancellable waiting.
    async fn before_loop(&mut self) -> Result<()> {
        Ok(())
    }

    /// One loop iteration. An error stops the loop.
    async fn loop_event(&mut self) -> Result<()>;

    /// Teardown hook, invoked exactly once after the loop stops. Revokes the
    /// registry entry and releases the keepalive channel; the remaining
    /// resources go when the session is dropped right after.
    async fn after_loop(&mut self);
}

/// Registers the session and hands it to the loop driver on a dedicated
/// task. A registry conflict aborts the start and the session is released
/// without ever running.
pub fn spawn<S: DeviceSession>(session: S, registry: &Arc<Registry>) -> Result<Arc<SessionHandle>> {
    let handle = session.handle().clone();
    registry.add(handle.clone())?;
    tokio::spawn(run_loop(session));
    Ok(handle)
}

async fn run_loop<S: DeviceSession>(mut session: S) {
    let handle = session.handle().clone();
    let serial = handle.serial().to_string();

    // A stop issued between registration and the first poll wins; the loop
    // is then skipped entirely and teardown still runs.
    if handle.advance(LoopState::Uninitialised, LoopState::Running) {
        match session.before_loop().await {
            Err(e) => log::warn!("[{}] session setup failed: {}", serial, e),
            Ok(()) => {
                while handle.is_running() {
                    if let Err(e) = session.loop_event().await {
                        log::warn!("[{}] session loop stopping: {}", serial, e);
                        break;
                    }
                }
            }
        }
    }

    handle.stop();
    session.after_loop().await;
    log::info!("[{}] session closed", serial);
}
