//! Embedded SOCKS5 proxy used as the tunnel's destination in server role
//!
//! - CONNECT only; BIND and UDP ASSOCIATE are answered with
//!   `CommandNotSupported`
//! - No Authentication
//! - IPv4, IPv6 and domain name targets
//! - [SOCKS5 (RFC 1928)](https://datatracker.ietf.org/doc/html/rfc1928)

pub mod address;
pub mod handshake;
pub mod protocol;
pub mod server;

pub use server::Socks5Server;
