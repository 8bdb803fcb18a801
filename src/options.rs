use crate::codec::SerializeType;
use crate::constants::DEFAULT_REQUEST_TIMEOUT;
use crate::protocol::{CompressType, ProtocolType};
use crate::transport::TransportType;
use std::time::Duration;

/// Configuration chosen when a client or server is constructed.
///
/// Fixed for the lifetime of that instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcOptions {
    pub protocol_type: ProtocolType,
    pub serialize_type: SerializeType,
    pub compress_type: CompressType,
    pub transport_type: TransportType,

    /// Upper bound for a single call. `Duration::ZERO` disables the bound.
    pub request_timeout: Duration,
}

impl Default for RpcOptions {
    fn default() -> Self {
        Self {
            protocol_type: ProtocolType::Default,
            serialize_type: SerializeType::Bitcode,
            compress_type: CompressType::None,
            transport_type: TransportType::Socket,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RpcOptions {
    pub fn with_serialize_type(mut self, serialize_type: SerializeType) -> Self {
        self.serialize_type = serialize_type;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_compress_type(mut self, compress_type: CompressType) -> Self {
        self.compress_type = compress_type;
        self
    }

    pub fn with_transport_type(mut self, transport_type: TransportType) -> Self {
        self.transport_type = transport_type;
        self
    }

    pub fn with_protocol_type(mut self, protocol_type: ProtocolType) -> Self {
        self.protocol_type = protocol_type;
        self
    }
}
