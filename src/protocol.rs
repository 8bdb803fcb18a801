mod compress_type;
mod header;
mod message;
mod message_type;
mod protocol_error;
mod protocol_type;
mod rpc_protocol;
mod status_code;

pub use compress_type::CompressType;
pub use header::Header;
pub use message::Message;
pub use message_type::MessageType;
pub use protocol_error::ProtocolError;
pub use protocol_type::ProtocolType;
pub use rpc_protocol::RpcProtocol;
pub use status_code::StatusCode;
