use crate::codec::{Codec, CodecError, SerializeType};
use serde::{Serialize, de::DeserializeOwned};

/// Compact, schema-less binary codec backed by `bitcode`'s serde support.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitcodeCodec;

impl Codec for BitcodeCodec {
    fn serialize_type(&self) -> SerializeType {
        SerializeType::Bitcode
    }

    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized,
    {
        bitcode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        bitcode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
