use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Reserved for payload compression. Only `None` is implemented; the tag is
/// still carried so peers can reject frames they cannot read.
#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum CompressType {
    #[default]
    None = 0,
}
