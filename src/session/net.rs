//! Network-attached device sessions.

use std::{net::IpAddr, sync::Arc};

use async_trait::async_trait;

use super::{spawn, DeviceSession, SessionHandle, TransportKind, IDLE_INTERVAL};
use crate::{
    control::{ControlService, SERVICE_LABEL},
    heartbeat::{self, HeartbeatChannel},
    registry::Registry,
    MuxdError, Result,
};

/// A device reachable over the network. Keeps a heartbeat exchange going
/// with the remote side; when the heartbeat service cannot be started the
/// session permanently falls back to probing the control service between
/// idle waits.
pub struct NetworkDevice {
    handle: Arc<SessionHandle>,
    registry: Arc<Registry>,
    control: Box<dyn ControlService>,
    heartbeat: Option<Box<dyn HeartbeatChannel>>,
}

impl NetworkDevice {
    /// Performs the one-time session setup and starts the loop. Heartbeat
    /// startup is attempted exactly once: a failure here is not fatal, the
    /// session just runs degraded for its whole life.
    pub async fn start(
        serial: &str,
        addr: IpAddr,
        control: Box<dyn ControlService>,
        registry: &Arc<Registry>,
    ) -> Result<Arc<SessionHandle>> {
        log::info!("[{}] new network device at {}", serial, addr);

        let heartbeat = match control.start_heartbeat(SERVICE_LABEL).await {
            Ok(channel) => Some(channel),
            Err(e) => {
                log::warn!(
                    "[{}] could not start heartbeat, falling back to control probes: {}",
                    serial,
                    e
                );
                None
            }
        };

        let device = NetworkDevice {
            handle: SessionHandle::new(serial, TransportKind::Network, Some(addr)),
            registry: registry.clone(),
            control,
            heartbeat,
        };
        spawn(device, registry)
    }
}

#[async_trait]
impl DeviceSession for NetworkDevice {
    fn handle(&self) -> &Arc<SessionHandle> {
        &self.handle
    }

    async fn loop_event(&mut self) -> Result<()> {
        match self.heartbeat.as_deref_mut() {
            Some(channel) => heartbeat::exchange(channel).await,
            None => {
                if !self.control.probe().await?.is_healthy() {
                    return Err(MuxdError::ControlUnreachable(
                        self.handle.serial().to_string(),
                    ));
                }
                self.handle.wait_for_timeout(IDLE_INTERVAL).await;
                Ok(())
            }
        }
    }

    async fn after_loop(&mut self) {
        self.registry.remove(self.handle.serial());
        self.heartbeat.take();
    }
}
