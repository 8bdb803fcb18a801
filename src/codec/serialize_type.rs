use crate::codec::{BitcodeCodec, Codec, CodecError, JsonCodec};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Serialize, de::DeserializeOwned};

/// Payload serialization tag carried in every header.
///
/// The tag itself selects the codec: both peers resolve it locally, so no
/// shared lookup table is needed.
#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum SerializeType {
    #[default]
    Bitcode = 0,
    Json = 1,
}

impl SerializeType {
    pub fn encode<T>(self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized,
    {
        match self {
            SerializeType::Bitcode => BitcodeCodec.encode(value),
            SerializeType::Json => JsonCodec.encode(value),
        }
    }

    pub fn decode<T>(self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        match self {
            SerializeType::Bitcode => BitcodeCodec.decode(bytes),
            SerializeType::Json => JsonCodec.decode(bytes),
        }
    }
}
