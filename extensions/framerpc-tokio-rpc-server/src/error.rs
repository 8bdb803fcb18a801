use framerpc::CodecError;
use std::io;
use thiserror::Error;

/// Why a service could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("rpc-server: service {0} has no suitable methods")]
    NoMethods(String),

    #[error("rpc-server: service already defined: {0}")]
    AlreadyRegistered(String),

    #[error("rpc-server: service {service} defines method {method} more than once")]
    DuplicateMethod { service: String, method: String },
}

#[derive(Debug, Error)]
pub enum RpcServerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("rpc-server: server is shut down")]
    Shutdown,
}

/// Failure while dispatching a single request. The display text becomes the
/// `error` field of the response.
#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    #[error("rpc-server: can't find service {0}")]
    UnknownService(String),

    #[error("rpc-server: can't find method {0}")]
    UnknownMethod(String),

    #[error("rpc-server: invalid arguments: {0}")]
    DecodeArgs(CodecError),

    #[error("{0}")]
    Method(String),

    #[error("rpc-server: can't encode reply: {0}")]
    EncodeReply(CodecError),

    #[error("rpc-server: method {0} panicked")]
    Panicked(String),
}
