mod connection;
mod memory_transport;
mod network;
mod socket_transport;
mod transport_addr;
mod transport_trait;

pub use connection::{BoxedConnection, Connection};
pub use memory_transport::{MemoryConnection, MemoryNetwork, MemoryServerTransport};
pub use network::Network;
pub use socket_transport::{SocketServerTransport, SocketTransport};
pub use transport_addr::TransportAddr;
pub use transport_trait::{ServerTransport, Transport, TransportType};
