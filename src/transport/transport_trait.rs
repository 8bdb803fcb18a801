use crate::transport::{BoxedConnection, TransportAddr};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::io;

/// Selects the default transport implementation for a client or server.
#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum TransportType {
    /// TCP or Unix-domain sockets, picked by the network family.
    #[default]
    Socket = 0,
}

/// Client side of a transport: opens connections.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn dial(&self, network: &str, address: &str) -> io::Result<BoxedConnection>;
}

/// Server side of a transport: accepts connections.
#[async_trait::async_trait]
pub trait ServerTransport: Send + Sync {
    async fn listen(&mut self, network: &str, address: &str) -> io::Result<()>;

    /// Waits until a peer connects.
    async fn accept(&self) -> io::Result<BoxedConnection>;

    fn local_addr(&self) -> io::Result<TransportAddr>;

    /// Stops listening. Connections already accepted are unaffected.
    fn close(&mut self) -> io::Result<()>;
}
