use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The bytes did not describe a value of the requested type.
    #[error("decode failed: {0}")]
    Decode(String),
}
