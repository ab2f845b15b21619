use crate::{
    cipher::{CipherSession, Keystream},
    config::Role,
};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Copy buffer size per direction
pub const COPY_BUF_SIZE: usize = 32 * 1024;

/// relay pairs a source and destination stream, applying the session's
/// transforms as the role dictates. The source -> destination copy runs on a
/// spawned task; the destination -> source copy runs here and decides when the
/// relay ends. Both streams are closed once the spawned copy is cancelled
/// after that.
pub async fn relay<S, D>(source: S, dest: D, session: CipherSession, role: Role)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    D: AsyncRead + AsyncWrite + Send + 'static,
{
    // Split both streams so each direction owns one half of each
    let (src_read, src_write) = tokio::io::split(source);
    let (dst_read, dst_write) = tokio::io::split(dest);

    // Hand each direction its transform
    let (upstream, downstream) = role.wire(session);

    // Source -> destination on its own task
    let upstream_task = tokio::spawn(async move {
        match pipe(src_read, dst_write, upstream).await {
            Ok(bytes) => debug!("{role} relay: {bytes} bytes source -> destination"),
            Err(e) => debug!("{role} relay: source -> destination ended: {e}"),
        }
    });

    // Destination -> source, blocks until EOF or error
    match pipe(dst_read, src_write, downstream).await {
        Ok(bytes) => debug!("{role} relay: {bytes} bytes destination -> source"),
        Err(e) => debug!("{role} relay: destination -> source ended: {e}"),
    }

    // Cancel the other direction, its halves drop and both sockets close
    upstream_task.abort();
}

/// pipe copies reader into writer until EOF, passing every chunk through the
/// keystream before it is written. Returns the number of bytes copied.
pub async fn pipe<R, W>(
    mut reader: R,
    mut writer: W,
    mut keystream: Box<dyn Keystream>,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }

        keystream.apply(&mut buf[..n]);
        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }
}
