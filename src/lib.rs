//! Core building blocks of framerpc: the wire protocol, pluggable payload
//! codecs, the stream transport abstraction, and the per-call `Context`.
//!
//! Runtime-specific client and server implementations live in the
//! `framerpc-tokio-rpc-client` and `framerpc-tokio-rpc-server` crates.

pub mod codec;
pub mod constants;
pub mod context;
pub mod options;
pub mod protocol;
pub mod transport;

pub use codec::{BitcodeCodec, Codec, CodecError, JsonCodec, SerializeType};
pub use context::{Context, Metadata};
pub use options::RpcOptions;
pub use protocol::{
    CompressType, Header, Message, MessageType, ProtocolError, ProtocolType, RpcProtocol,
    StatusCode,
};
pub use transport::{
    BoxedConnection, Connection, MemoryNetwork, MemoryServerTransport, Network,
    ServerTransport, SocketServerTransport, SocketTransport, Transport, TransportAddr,
    TransportType,
};
