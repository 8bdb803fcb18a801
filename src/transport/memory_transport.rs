use crate::transport::{
    BoxedConnection, Connection, Network, ServerTransport, Transport, TransportAddr,
};
use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::sync::mpsc;

/// Buffer size of each direction of an in-memory pipe.
const MEMORY_PIPE_CAPACITY: usize = 64 * 1024;

type Backlog = mpsc::UnboundedSender<MemoryConnection>;

/// An in-process network of named listeners.
///
/// Clones share the same address space, so a `MemoryServerTransport` and the
/// `MemoryNetwork` handed to a client must come from the same original value.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    listeners: Arc<Mutex<HashMap<String, Backlog>>>,
    next_peer_id: Arc<AtomicU64>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a server transport bound to this network.
    pub fn server_transport(&self) -> MemoryServerTransport {
        MemoryServerTransport {
            network: self.clone(),
            address: None,
            incoming: tokio::sync::Mutex::new(None),
        }
    }

    fn lock_listeners(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, Backlog>>> {
        self.listeners
            .lock()
            .map_err(|_| io::Error::other("memory network lock poisoned"))
    }
}

#[async_trait::async_trait]
impl Transport for MemoryNetwork {
    async fn dial(&self, network: &str, address: &str) -> io::Result<BoxedConnection> {
        if network.parse::<Network>()? != Network::Memory {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("MemoryNetwork cannot dial {network:?}"),
            ));
        }

        let peer_id = self.next_peer_id.fetch_add(1, Ordering::Relaxed);
        let client_addr = TransportAddr::Memory(format!("{address}#{peer_id}"));
        let server_addr = TransportAddr::Memory(address.to_string());

        let (client_end, server_end) = tokio::io::duplex(MEMORY_PIPE_CAPACITY);

        let mut listeners = self.lock_listeners()?;
        let refused = || io::Error::new(io::ErrorKind::ConnectionRefused, address.to_string());
        let backlog = listeners.get(address).ok_or_else(refused)?;

        let accepted = MemoryConnection {
            stream: server_end,
            local: server_addr.clone(),
            remote: client_addr.clone(),
        };
        if backlog.send(accepted).is_err() {
            listeners.remove(address);
            return Err(refused());
        }

        Ok(Box::new(MemoryConnection {
            stream: client_end,
            local: client_addr,
            remote: server_addr,
        }))
    }
}

/// Listening side of a `MemoryNetwork`.
pub struct MemoryServerTransport {
    network: MemoryNetwork,
    address: Option<String>,
    incoming: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<MemoryConnection>>>,
}

#[async_trait::async_trait]
impl ServerTransport for MemoryServerTransport {
    async fn listen(&mut self, network: &str, address: &str) -> io::Result<()> {
        if network.parse::<Network>()? != Network::Memory {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("MemoryServerTransport cannot listen on {network:?}"),
            ));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut listeners = self.network.lock_listeners()?;
            if listeners.contains_key(address) {
                return Err(io::Error::new(
                    io::ErrorKind::AddrInUse,
                    address.to_string(),
                ));
            }
            listeners.insert(address.to_string(), tx);
        }

        self.address = Some(address.to_string());
        *self.incoming.get_mut() = Some(rx);
        Ok(())
    }

    async fn accept(&self) -> io::Result<BoxedConnection> {
        let mut incoming = self.incoming.lock().await;
        let rx = incoming
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not listening"))?;

        match rx.recv().await {
            Some(conn) => Ok(Box::new(conn)),
            None => Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "memory listener closed",
            )),
        }
    }

    fn local_addr(&self) -> io::Result<TransportAddr> {
        self.address
            .clone()
            .map(TransportAddr::Memory)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not listening"))
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(address) = self.address.take() {
            self.network.lock_listeners()?.remove(&address);
        }
        *self.incoming.get_mut() = None;
        Ok(())
    }
}

/// One end of an in-memory pipe.
pub struct MemoryConnection {
    stream: DuplexStream,
    local: TransportAddr,
    remote: TransportAddr,
}

impl Connection for MemoryConnection {
    fn local_addr(&self) -> io::Result<TransportAddr> {
        Ok(self.local.clone())
    }

    fn remote_addr(&self) -> io::Result<TransportAddr> {
        Ok(self.remote.clone())
    }
}

impl AsyncRead for MemoryConnection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for MemoryConnection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}
