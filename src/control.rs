//! Control-service collaborator contract.
//!
//! Every device exposes a control service that answers a lightweight
//! handshake and can publish the heartbeat service. How either is reached
//! (raw socket, USB transfer framing) is the collaborator's business.

use async_trait::async_trait;

use crate::{heartbeat::HeartbeatChannel, Result};

/// Label identifying this daemon to the device-side services.
pub const SERVICE_LABEL: &str = "muxd";

/// Outcome of a control-service handshake probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    /// The handshake completed.
    Ok,
    /// The service answered but reported a pairing mismatch. It is still
    /// alive, which is all the probe needs to know.
    InvalidHostId,
    /// The service answered and rejected the handshake outright.
    Refused,
}

impl Handshake {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Handshake::Ok | Handshake::InvalidHostId)
    }
}

#[async_trait]
pub trait ControlService: Send + Sync {
    /// Starts the device's heartbeat service and returns a channel to it.
    async fn start_heartbeat(&self, label: &str) -> Result<Box<dyn HeartbeatChannel>>;

    /// Performs one handshake against the control service. An `Err` means
    /// the service did not answer at all.
    async fn probe(&self) -> Result<Handshake>;
}
