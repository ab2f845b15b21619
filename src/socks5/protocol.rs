// Reference layouts from RFC 1928
//
// Greeting
// +----+----------+----------+
// |VER | NMETHODS | METHODS  |
// +----+----------+----------+
// | 1  |    1     | 1 to 255 |
// +----+----------+----------+
//
// Request / reply
// +----+-----+-------+------+----------+----------+
// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
// +----+-----+-------+------+----------+----------+
// | 1  |  1  | X'00' |  1   | Variable |    2     |
// +----+-----+-------+------+----------+----------+

/// SOCKS protocol version byte, the only one served
pub const VERSION: u8 = 0x05;

// RSV: Fields marked RESERVED (RSV) must be set to X'00'.
pub const RSV: u8 = 0x00;

/// AddressType represents the SOCKS5 ATYP field
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    IPv4 = 0x01,
    DomainName = 0x03,
    IPv6 = 0x04,
}

impl TryFrom<u8> for AddressType {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(AddressType::IPv4),
            0x03 => Ok(AddressType::DomainName),
            0x04 => Ok(AddressType::IPv6),
            other => Err(other),
        }
    }
}

/// AuthMethod lists the methods this server knows how to answer with
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    NoAuth = 0x00,
    NoAcceptable = 0xFF,
}

/// Command represents SOCKS5 request commands
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect = 0x01,
    Bind = 0x02,
    UdpAssociate = 0x03,
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(Command::Connect),
            0x02 => Ok(Command::Bind),
            0x03 => Ok(Command::UdpAssociate),
            other => Err(other),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    Succeeded = 0x00,
    ServerFailure = 0x01,
    ConnectionNotAllowed = 0x02,
    NetworkUnreachable = 0x03,
    HostUnreachable = 0x04,
    ConnectionRefused = 0x05,
    CommandNotSupported = 0x07,
    AddrTypeUnsupported = 0x08,
}

impl From<&std::io::Error> for ReplyCode {
    fn from(e: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        match e.kind() {
            ErrorKind::ConnectionRefused => ReplyCode::ConnectionRefused,
            ErrorKind::NetworkUnreachable => ReplyCode::NetworkUnreachable,
            // Every other dial or resolve failure reads as an unreachable host
            _ => ReplyCode::HostUnreachable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn parses_known_bytes() {
        assert_eq!(AddressType::try_from(0x03), Ok(AddressType::DomainName));
        assert_eq!(AddressType::try_from(0x02), Err(0x02));
        assert_eq!(Command::try_from(0x01), Ok(Command::Connect));
        assert_eq!(Command::try_from(0x09), Err(0x09));
    }

    #[test]
    fn io_errors_map_to_reply_codes() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(ReplyCode::from(&refused), ReplyCode::ConnectionRefused);

        let network = io::Error::from(io::ErrorKind::NetworkUnreachable);
        assert_eq!(ReplyCode::from(&network), ReplyCode::NetworkUnreachable);
    }

    #[test]
    fn other_dial_failures_report_host_unreachable() {
        for kind in [
            io::ErrorKind::PermissionDenied,
            io::ErrorKind::TimedOut,
            io::ErrorKind::HostUnreachable,
        ] {
            assert_eq!(ReplyCode::from(&io::Error::from(kind)), ReplyCode::HostUnreachable);
        }

        let unresolved = io::Error::other("failed to lookup address information");
        assert_eq!(ReplyCode::from(&unresolved), ReplyCode::HostUnreachable);
    }
}
