use std::fmt;
use std::net::SocketAddr;

/// Address of either end of a `Connection`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransportAddr {
    Tcp(SocketAddr),
    /// Filesystem path of a Unix-domain socket, `None` when unnamed.
    Unix(Option<String>),
    Memory(String),
}

impl TransportAddr {
    pub fn as_socket_addr(&self) -> Option<SocketAddr> {
        match self {
            TransportAddr::Tcp(addr) => Some(*addr),
            _ => None,
        }
    }
}

impl fmt::Display for TransportAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportAddr::Tcp(addr) => write!(f, "tcp://{addr}"),
            TransportAddr::Unix(Some(path)) => write!(f, "unix://{path}"),
            TransportAddr::Unix(None) => write!(f, "unix://(unnamed)"),
            TransportAddr::Memory(name) => write!(f, "memory://{name}"),
        }
    }
}
