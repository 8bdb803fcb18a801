use thiserror::Error;

/// Failures while framing or unframing a message.
///
/// Every variant except `Io` means the byte stream can no longer be trusted;
/// the owning read loop stops on any of them.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("wrong protocol: bad magic {0:#04x} {1:#04x}")]
    BadMagic(u8, u8),

    #[error("invalid total length {0}")]
    InvalidLength(usize),

    #[error("header length {header_len} exceeds frame body of {available} bytes")]
    InvalidHeaderLength { header_len: usize, available: usize },

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The stream ended in the middle of a frame.
    #[error("stream closed before a full frame was read")]
    Truncated,

    #[error("unknown {field} tag {value}")]
    UnknownTag { field: &'static str, value: u8 },

    #[error("malformed header: {0}")]
    Header(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
