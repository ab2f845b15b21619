use crate::{
    cipher::CipherSession,
    config::{Role, TunnelConfig},
    relay::relay,
    socks5::Socks5Server,
};
use anyhow::{Context, Result, anyhow};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

/// Tunnel accepts connections and relays each one, encrypted, to its
/// destination
pub struct Tunnel {
    pub config: TunnelConfig,
    destination: String,
    listener: Option<TcpListener>,
}

/// Tunnel implementation block
impl Tunnel {
    /// new is a constructor for the Tunnel type
    pub fn new(config: TunnelConfig) -> Self {
        let destination = config.destination().to_string();
        Self {
            config,
            destination,
            listener: None,
        }
    }

    /// destination every accepted connection is dialed to
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// bind starts the embedded SOCKS5 proxy in server role, then binds the
    /// listen address. A failed listen bind is returned to the caller.
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_some() {
            return Err(anyhow!("[ERR] tunnel is already bound"));
        }

        if self.config.role == Role::Server {
            self.start_socks5().await;
        }

        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("[ERR] failed to bind {}", self.config.listen_addr))?;
        let addr = listener.local_addr()?;

        info!("local server started on {addr}");
        info!("role: {}", self.config.role);
        info!("destination: {}", self.destination);

        self.listener = Some(listener);
        Ok(addr)
    }

    /// start_socks5 binds the SOCKS5 proxy and points the tunnel at the bound
    /// address. Failures are logged and the tunnel keeps the configured address.
    async fn start_socks5(&mut self) {
        let mut socks5 = Socks5Server::new(self.config.socks5_addr.clone());
        match socks5.bind().await {
            Ok(addr) => {
                self.destination = addr.to_string();
                tokio::spawn(async move {
                    if let Err(e) = socks5.run().await {
                        error!("socks5 proxy stopped: {e}");
                    }
                });
            }
            Err(e) => error!("[ERR] socks5 proxy on {}: {e}", self.config.socks5_addr),
        }
    }

    /// run accepts connections forever, binding first if needed. Each
    /// connection is handled on its own task.
    pub async fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind().await?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow!("[ERR] listener missing after bind"))?;

        let destination: Arc<str> = Arc::from(self.destination.as_str());

        loop {
            // Accept incoming connection
            let (inbound, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("[ERR] accept failed: {e}");
                    continue;
                }
            };
            info!("new connection from {peer_addr}");

            // Clone shared state for the task
            let destination = Arc::clone(&destination);
            let key = Arc::clone(&self.config.key);
            let role = self.config.role;

            // Spawn async task
            tokio::spawn(async move {
                if let Err(e) = handle_connection(inbound, &destination, &key, role).await {
                    error!("connection from {peer_addr}: {e}");
                }
            });
        }
    }
}

/// handle_connection dials the destination, keys a fresh session and relays
/// until the destination side finishes
pub async fn handle_connection(
    inbound: TcpStream,
    destination: &str,
    key: &[u8],
    role: Role,
) -> Result<()> {
    // Connect to destination
    let outbound = TcpStream::connect(destination)
        .await
        .with_context(|| format!("[ERR] error connecting to destination {destination}"))?;

    // Key a fresh session for this connection
    let session = CipherSession::new(key)?;

    // Relay until the destination side is done
    relay(inbound, outbound, session, role).await;
    Ok(())
}
