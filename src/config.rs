use crate::cipher::{CipherSession, Keystream};
use std::{fmt, sync::Arc};

/// Default address the tunnel listens on
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:21666";

/// Default address dialed in client role
pub const DEFAULT_REMOTE_ADDR: &str = "127.0.0.1:61666";

/// Default pre-shared key (16 bytes -> AES-128)
pub const DEFAULT_KEY: &str = "examplekey123456";

/// Loopback address of the embedded SOCKS5 proxy in server role
pub const SOCKS5_ADDR: &str = "127.0.0.1:1080";

/// Role decides which side of a connection pair carries ciphertext
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Local applications connect in, the remote tunnel is the network side
    Client,
    /// Remote tunnels connect in, the embedded SOCKS5 proxy is the local side
    Server,
}

/// Role implementation block
impl Role {
    /// wire consumes a session and returns the transforms for the
    /// (source -> destination, destination -> source) directions
    pub fn wire(self, session: CipherSession) -> (Box<dyn Keystream>, Box<dyn Keystream>) {
        let (encrypt, decrypt) = session.into_parts();
        match self {
            // plaintext in from the app, ciphertext out to the network
            Role::Client => (encrypt, decrypt),
            // ciphertext in from the network, plaintext out to SOCKS5
            Role::Server => (decrypt, encrypt),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Server => write!(f, "server"),
        }
    }
}

/// TunnelConfig holds everything the acceptor needs for its lifetime
#[derive(Debug, Clone)]
pub struct TunnelConfig {
    pub role: Role,
    pub listen_addr: String,
    pub remote_addr: String,
    pub socks5_addr: String,
    pub key: Arc<[u8]>,
}

/// TunnelConfig implementation block
impl TunnelConfig {
    /// new is a constructor for the TunnelConfig type
    pub fn new(
        role: Role,
        listen_addr: impl Into<String>,
        remote_addr: impl Into<String>,
        key: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            role,
            listen_addr: listen_addr.into(),
            remote_addr: remote_addr.into(),
            socks5_addr: SOCKS5_ADDR.to_string(),
            key: Arc::from(key.as_ref()),
        }
    }

    /// with_socks5_addr moves the embedded SOCKS5 proxy off its default address
    pub fn with_socks5_addr(mut self, addr: impl Into<String>) -> Self {
        self.socks5_addr = addr.into();
        self
    }

    /// destination is the address every accepted connection is paired with
    pub fn destination(&self) -> &str {
        match self.role {
            Role::Client => &self.remote_addr,
            Role::Server => &self.socks5_addr,
        }
    }
}
