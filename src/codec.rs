mod bitcode_codec;
mod codec_error;
mod codec_trait;
mod json_codec;
mod serialize_type;

pub use bitcode_codec::BitcodeCodec;
pub use codec_error::CodecError;
pub use codec_trait::Codec;
pub use json_codec::JsonCodec;
pub use serialize_type::SerializeType;
