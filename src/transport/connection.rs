use crate::transport::TransportAddr;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// A bidirectional byte stream between two peers.
///
/// Reading, writing and closing come from `AsyncRead` / `AsyncWrite`; framing
/// lives in the protocol layer.
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    fn local_addr(&self) -> io::Result<TransportAddr>;
    fn remote_addr(&self) -> io::Result<TransportAddr>;
}

pub type BoxedConnection = Box<dyn Connection>;

impl Connection for TcpStream {
    fn local_addr(&self) -> io::Result<TransportAddr> {
        TcpStream::local_addr(self).map(TransportAddr::Tcp)
    }

    fn remote_addr(&self) -> io::Result<TransportAddr> {
        self.peer_addr().map(TransportAddr::Tcp)
    }
}

#[cfg(unix)]
impl Connection for tokio::net::UnixStream {
    fn local_addr(&self) -> io::Result<TransportAddr> {
        tokio::net::UnixStream::local_addr(self).map(|addr| unix_addr(&addr))
    }

    fn remote_addr(&self) -> io::Result<TransportAddr> {
        self.peer_addr().map(|addr| unix_addr(&addr))
    }
}

#[cfg(unix)]
pub(crate) fn unix_addr(addr: &tokio::net::unix::SocketAddr) -> TransportAddr {
    TransportAddr::Unix(
        addr.as_pathname()
            .map(|path| path.to_string_lossy().into_owned()),
    )
}
