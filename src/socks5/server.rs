use crate::socks5::handshake::{self, UNSPECIFIED};
use crate::socks5::protocol::ReplyCode;
use anyhow::{Result, anyhow};
use std::net::SocketAddr;
use tokio::{
    io::copy_bidirectional,
    net::{TcpListener, TcpStream},
};
use tracing::{debug, error, info};

/// Socks5Server is the CONNECT-only, no-auth proxy the tunnel forwards into
/// when running in server role
pub struct Socks5Server {
    pub listen_addr: String,
    listener: Option<TcpListener>,
}

/// Socks5Server implementation block
impl Socks5Server {
    /// new is a constructor for the Socks5Server type
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            listener: None,
        }
    }

    /// bind to the listen address and return the bound address
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_some() {
            return Err(anyhow!("[ERR] SOCKS5 server is already bound"));
        }

        let listener = TcpListener::bind(&self.listen_addr).await?;
        let addr = listener.local_addr()?;
        info!("socks5 proxy started on {addr}");

        self.listener = Some(listener);
        Ok(addr)
    }

    /// run accepts clients until the listener fails, binding first if needed
    pub async fn run(mut self) -> Result<()> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => {
                self.bind().await?;
                self.listener
                    .take()
                    .ok_or_else(|| anyhow!("[ERR] SOCKS5 listener missing after bind"))?
            }
        };

        loop {
            let (inbound, peer_addr) = listener.accept().await?;

            tokio::spawn(async move {
                debug!("socks5 client: {peer_addr}");

                if let Err(e) = handle_connection(inbound).await {
                    error!("socks5 connection from {peer_addr}: {e}");
                }
            });
        }
    }
}

/// handle_connection runs greeting, request and relay for one client
async fn handle_connection(mut inbound: TcpStream) -> Result<()> {
    handshake::negotiate_auth(&mut inbound).await?;
    let target = handshake::read_connect_request(&mut inbound).await?;

    let mut outbound = match TcpStream::connect(target.to_string()).await {
        Ok(outbound) => outbound,
        Err(e) => {
            handshake::send_reply(&mut inbound, ReplyCode::from(&e), UNSPECIFIED).await?;
            return Err(anyhow!("[ERR] connect to {target} failed: {e}"));
        }
    };

    handshake::send_reply(&mut inbound, ReplyCode::Succeeded, outbound.local_addr()?).await?;

    let (from_client, from_target) = copy_bidirectional(&mut inbound, &mut outbound).await?;
    debug!(
        "socks5 {target} closed: {from_client} bytes from client, {from_target} bytes from target"
    );

    Ok(())
}
