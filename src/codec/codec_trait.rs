use crate::codec::{CodecError, SerializeType};
use serde::{Serialize, de::DeserializeOwned};

/// Serializes call arguments and return values to and from opaque payloads.
///
/// A codec only ever sees the body of a message. Headers use a fixed
/// encoding so that routing never depends on the negotiated codec.
pub trait Codec: Send + Sync {
    /// The tag written into every header produced with this codec.
    fn serialize_type(&self) -> SerializeType;

    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized;

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned;
}
