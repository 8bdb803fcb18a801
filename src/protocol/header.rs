use crate::codec::SerializeType;
use crate::constants::SERVICE_METHOD_SEPARATOR;
use crate::protocol::{CompressType, MessageType, ProtocolError, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Routing and control metadata accompanying every message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Header {
    /// Correlates a response with its request. Chosen by the client and
    /// echoed unchanged by the server.
    pub seq: u64,
    pub message_type: MessageType,
    pub compress_type: CompressType,
    pub serialize_type: SerializeType,
    pub status_code: StatusCode,
    pub service_name: String,
    pub method_name: String,

    /// Empty unless `status_code` is `StatusCode::Error`.
    pub error: String,

    /// Schema-less side channel (e.g. the caller's request timeout).
    pub metadata: HashMap<String, String>,
}

/// On-wire shape of `Header`, encoded as a MessagePack map keyed by field
/// name. Unknown keys are skipped and missing keys take their defaults.
///
/// Tags travel as raw bytes so an unknown value surfaces as
/// `ProtocolError::UnknownTag` rather than a generic decode error.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct WireHeader {
    seq: u64,
    message_type: u8,
    compress_type: u8,
    serialize_type: u8,
    status_code: u8,
    service_name: String,
    method_name: String,
    error: String,
    metadata: HashMap<String, String>,
}

impl Header {
    /// Returns `"Service.Method"`.
    pub fn service_method(&self) -> String {
        format!(
            "{}{}{}",
            self.service_name, SERVICE_METHOD_SEPARATOR, self.method_name
        )
    }

    pub fn is_error(&self) -> bool {
        self.status_code == StatusCode::Error
    }

    /// Serializes the header as a named MessagePack map.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let wire = WireHeader {
            seq: self.seq,
            message_type: self.message_type.into(),
            compress_type: self.compress_type.into(),
            serialize_type: self.serialize_type.into(),
            status_code: self.status_code.into(),
            service_name: self.service_name.clone(),
            method_name: self.method_name.clone(),
            error: self.error.clone(),
            metadata: self.metadata.clone(),
        };

        rmp_serde::to_vec_named(&wire).map_err(|e| ProtocolError::Header(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let wire: WireHeader =
            rmp_serde::from_slice(bytes).map_err(|e| ProtocolError::Header(e.to_string()))?;

        Ok(Header {
            seq: wire.seq,
            message_type: MessageType::try_from(wire.message_type).map_err(|_| {
                ProtocolError::UnknownTag {
                    field: "message type",
                    value: wire.message_type,
                }
            })?,
            compress_type: CompressType::try_from(wire.compress_type).map_err(|_| {
                ProtocolError::UnknownTag {
                    field: "compress type",
                    value: wire.compress_type,
                }
            })?,
            serialize_type: SerializeType::try_from(wire.serialize_type).map_err(|_| {
                ProtocolError::UnknownTag {
                    field: "serialize type",
                    value: wire.serialize_type,
                }
            })?,
            status_code: StatusCode::try_from(wire.status_code).map_err(|_| {
                ProtocolError::UnknownTag {
                    field: "status code",
                    value: wire.status_code,
                }
            })?,
            service_name: wire.service_name,
            method_name: wire.method_name,
            error: wire.error,
            metadata: wire.metadata,
        })
    }
}
