use framerpc::{CodecError, ProtocolError};
use std::io;
use thiserror::Error;

/// Why a call did not produce a reply.
///
/// Each variant corresponds to one failure class so callers can tell an
/// application error from a timeout or a broken connection.
#[derive(Debug, Error)]
pub enum RpcCallError {
    /// Writing the request to the transport failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Encoding the arguments or decoding the reply failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The remote method (or the server's dispatcher) reported an error.
    #[error("{0}")]
    Remote(String),

    #[error("request timeout")]
    Timeout,

    #[error("client is shut down")]
    Shutdown,

    /// The connection ended while the call was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    #[error("invalid service method {0:?}: expected \"Service.Method\"")]
    InvalidServiceMethod(String),
}
