#![allow(dead_code)]
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    StreamExt,
};
use muxd::{ControlService, Handshake, HeartbeatChannel, HeartbeatMessage, MuxdError};

/// Heartbeat channel backed by a pair of in-memory queues. The test side
/// injects requests and observes acknowledgements.
pub struct MockHeartbeat {
    requests: UnboundedReceiver<HeartbeatMessage>,
    acks: UnboundedSender<HeartbeatMessage>,
}

#[async_trait]
impl HeartbeatChannel for MockHeartbeat {
    async fn receive(&mut self, timeout: Duration) -> muxd::Result<HeartbeatMessage> {
        match tokio::time::timeout(timeout, self.requests.next()).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(MuxdError::ChannelClosed),
            Err(_) => Err(MuxdError::HeartbeatTimeout),
        }
    }

    async fn send(&mut self, message: &HeartbeatMessage) -> muxd::Result<()> {
        self.acks
            .unbounded_send(message.clone())
            .map_err(|_| MuxdError::ChannelClosed)
    }
}

/// Returns a channel plus the request injector and acknowledgement receiver.
pub fn heartbeat_channel() -> (
    Box<dyn HeartbeatChannel>,
    UnboundedSender<HeartbeatMessage>,
    UnboundedReceiver<HeartbeatMessage>,
) {
    let (requests_tx, requests_rx) = mpsc::unbounded();
    let (acks_tx, acks_rx) = mpsc::unbounded();
    let channel = MockHeartbeat {
        requests: requests_rx,
        acks: acks_tx,
    };
    (Box::new(channel), requests_tx, acks_rx)
}

/// Control-service stub: hands out at most one heartbeat channel and answers
/// probes according to a switchable health flag.
#[derive(Clone)]
pub struct MockControl {
    inner: Arc<MockControlInner>,
}

struct MockControlInner {
    channel: Mutex<Option<Box<dyn HeartbeatChannel>>>,
    healthy: AtomicBool,
    probes: AtomicUsize,
}

impl MockControl {
    pub fn healthy() -> Self {
        Self::build(None, true)
    }

    pub fn unhealthy() -> Self {
        Self::build(None, false)
    }

    pub fn with_channel(channel: Box<dyn HeartbeatChannel>) -> Self {
        Self::build(Some(channel), true)
    }

    fn build(channel: Option<Box<dyn HeartbeatChannel>>, healthy: bool) -> Self {
        MockControl {
            inner: Arc::new(MockControlInner {
                channel: Mutex::new(channel),
                healthy: AtomicBool::new(healthy),
                probes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.inner.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Number of handshake probes answered so far.
    pub fn probes(&self) -> usize {
        self.inner.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlService for MockControl {
    async fn start_heartbeat(&self, _label: &str) -> muxd::Result<Box<dyn HeartbeatChannel>> {
        self.inner
            .channel
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| MuxdError::HeartbeatUnavailable("service not published".to_string()))
    }

    async fn probe(&self) -> muxd::Result<Handshake> {
        self.inner.probes.fetch_add(1, Ordering::SeqCst);
        if self.inner.healthy.load(Ordering::SeqCst) {
            Ok(Handshake::Ok)
        } else {
            Ok(Handshake::Refused)
        }
    }
}
