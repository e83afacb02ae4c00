//! Self-managed relayed connections.
//!
//! A relay bridges one client stream to one device-side service port. Once
//! established it floats free of its creator: the spawned task owns both
//! endpoints and releases them when either side closes or the copy fails.
//! Relays are not externally cancellable; they run to natural completion.

use std::net::{IpAddr, SocketAddr};

use tokio::{
    io::{self, AsyncRead, AsyncWrite},
    net::TcpStream,
};

use crate::Result;

/// A pending bridge between `client` and the service at `addr:port`.
pub struct RelayConnection<C> {
    addr: IpAddr,
    port: u16,
    client: C,
}

impl<C> RelayConnection<C>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(addr: IpAddr, port: u16, client: C) -> Self {
        RelayConnection { addr, port, client }
    }

    /// Opens the device-side connection and detaches. On success the relay
    /// owns itself and the caller must not touch it again; on failure the
    /// consumed connection is dropped here, closing the client handle with
    /// it.
    pub async fn establish(self) -> Result<()> {
        let peer = SocketAddr::new(self.addr, self.port);
        let device = TcpStream::connect(peer).await?;
        log::info!("[{}] relay established", peer);

        let mut client = self.client;
        tokio::spawn(async move {
            let mut device = device;
            match io::copy_bidirectional(&mut client, &mut device).await {
                Ok((up, down)) => {
                    log::info!("[{}] relay closed ({} bytes up, {} bytes down)", peer, up, down)
                }
                Err(e) => log::info!("[{}] relay closed: {}", peer, e),
            }
        });

        Ok(())
    }
}
