//! USB-attached device sessions.

use std::sync::Arc;

use async_trait::async_trait;

use super::{spawn, DeviceSession, SessionHandle, TransportKind, IDLE_INTERVAL};
use crate::{control::ControlService, registry::Registry, MuxdError, Result};

/// A device attached over USB. The heartbeat service is not spoken on this
/// transport, so the loop only probes the control service between idle
/// waits. The opaque USB transport handle lives inside the control
/// collaborator and is released when the session winds down.
pub struct UsbDevice {
    handle: Arc<SessionHandle>,
    registry: Arc<Registry>,
    control: Box<dyn ControlService>,
}

impl UsbDevice {
    pub fn start(
        serial: &str,
        control: Box<dyn ControlService>,
        registry: &Arc<Registry>,
    ) -> Result<Arc<SessionHandle>> {
        log::info!("[{}] new usb device", serial);

        let device = UsbDevice {
            handle: SessionHandle::new(serial, TransportKind::Usb, None),
            registry: registry.clone(),
            control,
        };
        spawn(device, registry)
    }
}

#[async_trait]
impl DeviceSession for UsbDevice {
    fn handle(&self) -> &Arc<SessionHandle> {
        &self.handle
    }

    async fn loop_event(&mut self) -> Result<()> {
        if !self.control.probe().await?.is_healthy() {
            return Err(MuxdError::ControlUnreachable(
                self.handle.serial().to_string(),
            ));
        }
        self.handle.wait_for_timeout(IDLE_INTERVAL).await;
        Ok(())
    }

    async fn after_loop(&mut self) {
        self.registry.remove(self.handle.serial());
    }
}
