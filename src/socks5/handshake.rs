use crate::socks5::{
    address::TargetAddr,
    protocol::{AddressType, AuthMethod, Command, RSV, ReplyCode, VERSION},
};
use anyhow::{Result, bail};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bound address sent with every failure reply
pub const UNSPECIFIED: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

/// negotiate_auth reads the client greeting and selects NO AUTH, the only
/// method served. Clients that do not offer it get NO ACCEPTABLE and an error.
pub async fn negotiate_auth<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let version = stream.read_u8().await?;
    if version != VERSION {
        bail!("[ERR] not SOCKS5: version {version:#04x}");
    }

    let n_methods = stream.read_u8().await? as usize;
    let mut methods = vec![0u8; n_methods];
    stream.read_exact(&mut methods).await?;

    if !methods.contains(&(AuthMethod::NoAuth as u8)) {
        stream
            .write_all(&[VERSION, AuthMethod::NoAcceptable as u8])
            .await?;
        bail!("[ERR] no acceptable authentication method in {methods:?}");
    }

    stream.write_all(&[VERSION, AuthMethod::NoAuth as u8]).await?;
    Ok(())
}

/// read_connect_request reads a request and returns its target when the
/// command is CONNECT. Anything else is answered with an error reply.
pub async fn read_connect_request<S>(stream: &mut S) -> Result<TargetAddr>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    let [version, command, _rsv, atyp] = header;

    if version != VERSION {
        bail!("[ERR] not SOCKS5: version {version:#04x}");
    }

    match Command::try_from(command) {
        Ok(Command::Connect) => {}
        Ok(other) => {
            send_reply(stream, ReplyCode::CommandNotSupported, UNSPECIFIED).await?;
            bail!("[ERR] {other:?} not supported");
        }
        Err(byte) => {
            send_reply(stream, ReplyCode::CommandNotSupported, UNSPECIFIED).await?;
            bail!("[ERR] unknown command {byte:#04x}");
        }
    }

    let Ok(addr_type) = AddressType::try_from(atyp) else {
        send_reply(stream, ReplyCode::AddrTypeUnsupported, UNSPECIFIED).await?;
        bail!("[ERR] unknown address type {atyp:#04x}");
    };

    TargetAddr::read_from(stream, addr_type).await
}

/// send_reply writes a request reply carrying the bound address
pub async fn send_reply<S>(
    stream: &mut S,
    reply_code: ReplyCode,
    bound_addr: SocketAddr,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut reply = vec![VERSION, reply_code as u8, RSV];
    TargetAddr::Ip(bound_addr).encode(&mut reply)?;
    stream.write_all(&reply).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn selects_no_auth() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x02, 0x02, 0x00]).await.unwrap();

        negotiate_auth(&mut server).await.unwrap();

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [0x05, 0x00]);
    }

    #[tokio::test]
    async fn rejects_clients_without_no_auth() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x01, 0x02]).await.unwrap();

        assert!(negotiate_auth(&mut server).await.is_err());

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [0x05, 0xFF]);
    }

    #[tokio::test]
    async fn rejects_socks4() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();
        assert!(negotiate_auth(&mut server).await.is_err());
    }

    #[tokio::test]
    async fn parses_connect_request() {
        let (mut client, mut server) = duplex(64);
        client
            .write_all(&[0x05, 0x01, 0x00, 0x01, 10, 0, 0, 7, 0x00, 0x50])
            .await
            .unwrap();

        let target = read_connect_request(&mut server).await.unwrap();
        assert_eq!(target.to_string(), "10.0.0.7:80");
    }

    #[tokio::test]
    async fn answers_bind_with_command_not_supported() {
        let (mut client, mut server) = duplex(64);
        client
            .write_all(&[0x05, 0x02, 0x00, 0x01, 10, 0, 0, 7, 0x00, 0x50])
            .await
            .unwrap();

        assert!(read_connect_request(&mut server).await.is_err());

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [0x05, 0x07, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn answers_unknown_address_type() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x01, 0x00, 0x09]).await.unwrap();

        assert!(read_connect_request(&mut server).await.is_err());

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply[1], ReplyCode::AddrTypeUnsupported as u8);
    }
}
