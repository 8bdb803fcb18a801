use crate::transport::{
    BoxedConnection, Network, ServerTransport, Transport, TransportAddr,
};
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream, lookup_host};

/// Dials TCP or Unix-domain sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketTransport;

#[async_trait::async_trait]
impl Transport for SocketTransport {
    async fn dial(&self, network: &str, address: &str) -> io::Result<BoxedConnection> {
        match network.parse::<Network>()? {
            Network::Unix => dial_unix(address).await,
            Network::Memory => Err(memory_unsupported()),
            tcp => {
                let mut last_err = None;
                for addr in resolve(tcp, address).await? {
                    match TcpStream::connect(addr).await {
                        Ok(stream) => {
                            stream.set_nodelay(true)?;
                            tracing::debug!("Dialed {}", addr);
                            return Ok(Box::new(stream));
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                Err(last_err.unwrap_or_else(|| no_addresses(tcp, address)))
            }
        }
    }
}

enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix {
        listener: tokio::net::UnixListener,
        path: std::path::PathBuf,
    },
}

/// Listens on TCP or Unix-domain sockets.
#[derive(Default)]
pub struct SocketServerTransport {
    listener: Option<Listener>,
}

impl SocketServerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already bound `TcpListener`.
    pub fn from_tcp_listener(listener: TcpListener) -> Self {
        Self {
            listener: Some(Listener::Tcp(listener)),
        }
    }
}

#[async_trait::async_trait]
impl ServerTransport for SocketServerTransport {
    async fn listen(&mut self, network: &str, address: &str) -> io::Result<()> {
        let listener = match network.parse::<Network>()? {
            Network::Unix => listen_unix(address)?,
            Network::Memory => return Err(memory_unsupported()),
            tcp => {
                let addrs = resolve(tcp, address).await?;
                if addrs.is_empty() {
                    return Err(no_addresses(tcp, address));
                }
                Listener::Tcp(TcpListener::bind(addrs.as_slice()).await?)
            }
        };

        self.listener = Some(listener);
        Ok(())
    }

    async fn accept(&self) -> io::Result<BoxedConnection> {
        match self.listener.as_ref() {
            Some(Listener::Tcp(listener)) => {
                let (stream, _) = listener.accept().await?;
                stream.set_nodelay(true)?;
                Ok(Box::new(stream))
            }
            #[cfg(unix)]
            Some(Listener::Unix { listener, .. }) => {
                let (stream, _) = listener.accept().await?;
                Ok(Box::new(stream))
            }
            None => Err(not_listening()),
        }
    }

    fn local_addr(&self) -> io::Result<TransportAddr> {
        match self.listener.as_ref() {
            Some(Listener::Tcp(listener)) => listener.local_addr().map(TransportAddr::Tcp),
            #[cfg(unix)]
            Some(Listener::Unix { listener, .. }) => listener
                .local_addr()
                .map(|addr| super::connection::unix_addr(&addr)),
            None => Err(not_listening()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.listener.take() {
            #[cfg(unix)]
            Some(Listener::Unix { listener, path }) => {
                drop(listener);
                match std::fs::remove_file(&path) {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

/// Resolves `address`, keeping only the IP family requested by `network`.
async fn resolve(network: Network, address: &str) -> io::Result<Vec<SocketAddr>> {
    let addrs = lookup_host(address).await?;
    Ok(addrs
        .filter(|addr| match network {
            Network::Tcp4 => addr.is_ipv4(),
            Network::Tcp6 => addr.is_ipv6(),
            _ => true,
        })
        .collect())
}

#[cfg(unix)]
async fn dial_unix(address: &str) -> io::Result<BoxedConnection> {
    let stream = tokio::net::UnixStream::connect(address).await?;
    Ok(Box::new(stream))
}

#[cfg(not(unix))]
async fn dial_unix(_address: &str) -> io::Result<BoxedConnection> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "unix sockets are not available on this platform",
    ))
}

#[cfg(unix)]
fn listen_unix(address: &str) -> io::Result<Listener> {
    let listener = tokio::net::UnixListener::bind(address)?;
    Ok(Listener::Unix {
        listener,
        path: address.into(),
    })
}

#[cfg(not(unix))]
fn listen_unix(_address: &str) -> io::Result<Listener> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "unix sockets are not available on this platform",
    ))
}

fn memory_unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "memory network requires a MemoryNetwork transport",
    )
}

fn no_addresses(network: Network, address: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        format!("no {} address found for {address}", network.as_str()),
    )
}

fn not_listening() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is not listening")
}
