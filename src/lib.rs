//! An encrypting TCP tunnel
//!
//! Two tunnel processes sit between an application and the internet:
//!
//! - **client** role: accepts plaintext from local applications, encrypts it
//!   towards the remote tunnel and decrypts the replies
//! - **server** role: accepts ciphertext from client tunnels, decrypts it into
//!   an embedded SOCKS5 proxy and encrypts the replies
//!
//! Bytes are transformed with AES-CFB (128/192/256 by key length) and carried
//! without any framing.
//!
//! # Example
//! ```no_run
//! use proxytcp::{Role, Tunnel, TunnelConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TunnelConfig::new(
//!         Role::Client,
//!         "127.0.0.1:21666",
//!         "203.0.113.10:21666",
//!         "examplekey123456",
//!     );
//!     Tunnel::new(config).run().await
//! }
//! ```

pub mod cipher;
pub mod config;
pub mod relay;
pub mod socks5;
pub mod tunnel;

// Re-export main types at crate root for convenience
pub use cipher::{CipherError, CipherSession};
pub use config::{Role, TunnelConfig};
pub use socks5::Socks5Server;
pub use tunnel::Tunnel;
