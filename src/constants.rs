use std::time::Duration;

// Frame related constants
pub const MAGIC: [u8; 2] = [0xAB, 0xBA];
pub const PROTOCOL_VERSION: u8 = 0;
pub const MAGIC_SIZE: usize = 2;
pub const VERSION_SIZE: usize = 1;

/// Size of the `total-length` field that follows the magic and version bytes.
pub const TOTAL_LENGTH_FIELD_SIZE: usize = 4;

/// Size of the `header-length` field at the start of the length-counted region.
///
/// Because `total-length` counts this field, the smallest legal
/// `total-length` is exactly this value (empty header, empty body).
pub const HEADER_LENGTH_FIELD_SIZE: usize = 4;

/// Bytes preceding the length-counted region: magic + version + total-length.
pub const FRAME_PREFIX_SIZE: usize = MAGIC_SIZE + VERSION_SIZE + TOTAL_LENGTH_FIELD_SIZE; // 2 + 1 + 4 = 7

/// Upper bound for `total-length`. A peer announcing more than this is
/// treated as a protocol violation instead of an allocation request.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;

/// Metadata key carrying the caller's request timeout, in milliseconds.
pub const REQUEST_TIMEOUT_KEY: &str = "rpc_request_timeout";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Separator between service and method in `"Service.Method"` names.
pub const SERVICE_METHOD_SEPARATOR: char = '.';
