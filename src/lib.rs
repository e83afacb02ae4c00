//! Device session engine for a USB/network device multiplexing daemon.
//!
//! Each attached device is driven by a [`session::DeviceSession`], a small
//! state machine running on its own task. Network-attached devices keep a
//! heartbeat exchange going with the remote side and fall back to periodic
//! control-service probes when the heartbeat service is unavailable;
//! USB-attached devices only probe. Live sessions are tracked in a
//! [`Registry`] keyed by serial, and client connect requests are bridged to
//! device-side services by self-managed [`RelayConnection`]s.
//!
//! Transport framing, device discovery and the structured-document encoding
//! of the heartbeat protocol are collaborator concerns, consumed through the
//! [`ControlService`] and [`HeartbeatChannel`] traits.
//!
//! ```no_run
//! use std::sync::Arc;
//! use muxd::{NetworkDevice, Registry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(Registry::new());
//!     // `control` talks to the device's control service.
//!     # let control: Box<dyn muxd::ControlService> = unimplemented!();
//!     let session =
//!         NetworkDevice::start("0123456789abcdef", "10.0.1.7".parse()?, control, &registry)
//!             .await?;
//!
//!     // The session loop now runs until the device goes away, or:
//!     session.stop();
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod control;
pub mod heartbeat;
pub mod registry;
pub mod relay;
pub mod session;

pub use control::{ControlService, Handshake};
pub use heartbeat::{HeartbeatChannel, HeartbeatMessage};
pub use registry::Registry;
pub use relay::RelayConnection;
pub use session::{
    DeviceSession, LoopState, NetworkDevice, SessionHandle, TransportKind, UsbDevice,
};

pub type Result<T, E = MuxdError> = core::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum MuxdError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("device {0} is already registered")]
    DeviceRegistered(String),

    #[error("timed out waiting for a heartbeat request")]
    HeartbeatTimeout,

    #[error("heartbeat channel error: {0}")]
    HeartbeatFailure(String),

    #[error("heartbeat channel has closed")]
    ChannelClosed,

    #[error("could not start the heartbeat service: {0}")]
    HeartbeatUnavailable(String),

    #[error("lost connection with the control service on {0}")]
    ControlUnreachable(String),

    #[error("device {0} does not accept relayed connections")]
    RelayUnsupported(String),

    #[error("internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
