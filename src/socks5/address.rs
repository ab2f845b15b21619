use crate::socks5::protocol::AddressType;
use anyhow::{Result, anyhow};
use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};
use tokio::io::{AsyncRead, AsyncReadExt};

/// TargetAddr is the DST.ADDR/DST.PORT pair of a SOCKS5 request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    Ip(SocketAddr),
    Domain(String, u16),
}

/// TargetAddr implementation block
impl TargetAddr {
    /// read_from parses an address of the given type, followed by its port,
    /// off the stream
    pub async fn read_from<R>(reader: &mut R, addr_type: AddressType) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let target = match addr_type {
            AddressType::IPv4 => {
                let mut octets = [0u8; 4];
                reader.read_exact(&mut octets).await?;
                let port = reader.read_u16().await?;
                TargetAddr::Ip(SocketAddr::from((Ipv4Addr::from(octets), port)))
            }
            AddressType::IPv6 => {
                let mut octets = [0u8; 16];
                reader.read_exact(&mut octets).await?;
                let port = reader.read_u16().await?;
                TargetAddr::Ip(SocketAddr::from((Ipv6Addr::from(octets), port)))
            }
            AddressType::DomainName => {
                // First octet holds the number of octets to follow
                let len = reader.read_u8().await? as usize;
                if len == 0 {
                    return Err(anyhow!("[ERR] domain length cannot be 0"));
                }

                let mut domain = vec![0u8; len];
                reader.read_exact(&mut domain).await?;
                let domain = String::from_utf8(domain)
                    .map_err(|e| anyhow!("[ERR] invalid domain: {e}"))?;
                let port = reader.read_u16().await?;
                TargetAddr::Domain(domain, port)
            }
        };

        Ok(target)
    }

    /// encode appends ATYP, address and port in wire order
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => {
                out.push(AddressType::IPv4 as u8);
                out.extend_from_slice(&addr.ip().octets());
                out.extend_from_slice(&addr.port().to_be_bytes());
            }
            TargetAddr::Ip(SocketAddr::V6(addr)) => {
                out.push(AddressType::IPv6 as u8);
                out.extend_from_slice(&addr.ip().octets());
                out.extend_from_slice(&addr.port().to_be_bytes());
            }
            TargetAddr::Domain(domain, port) => {
                let len = u8::try_from(domain.len())
                    .map_err(|_| anyhow!("[ERR] domain name too long: {}", domain.len()))?;
                out.push(AddressType::DomainName as u8);
                out.push(len);
                out.extend_from_slice(domain.as_bytes());
                out.extend_from_slice(&port.to_be_bytes());
            }
        }

        Ok(())
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{addr}"),
            TargetAddr::Domain(domain, port) => write!(f, "{domain}:{port}"),
        }
    }
}
