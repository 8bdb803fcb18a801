use crate::{
    constants::{
        HEADER_LENGTH_FIELD_SIZE, MAGIC, MAGIC_SIZE, MAX_FRAME_LENGTH, PROTOCOL_VERSION,
        TOTAL_LENGTH_FIELD_SIZE, VERSION_SIZE,
    },
    protocol::{Header, Message, ProtocolError},
};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Provides encoding and decoding of framed messages.
///
/// ```text
/// [2 bytes magic 0xAB 0xBA][1 byte version][4 bytes total-length]
/// [4 bytes header-length][header-length bytes header][body]
/// ```
///
/// All integers are big-endian. `total-length` counts the header-length field,
/// the header and the body; it does not count itself or anything before it.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpcProtocol;

impl RpcProtocol {
    /// Encodes a `Message` into one contiguous frame.
    ///
    /// The returned buffer is meant to be written with a single write call so
    /// that concurrent writers on the same connection never interleave frames.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to frame.
    ///
    /// # Returns
    ///
    /// The complete frame, or `ProtocolError::FrameTooLarge` if the frame would
    /// exceed `MAX_FRAME_LENGTH`, or `ProtocolError::Header` if the header
    /// cannot be serialized. Nothing is produced on error.
    pub fn encode_message(&self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        let header_bytes = message.header.to_bytes()?;
        let total_len = HEADER_LENGTH_FIELD_SIZE + header_bytes.len() + message.data.len();

        if total_len > MAX_FRAME_LENGTH {
            return Err(ProtocolError::FrameTooLarge {
                size: total_len,
                max: MAX_FRAME_LENGTH,
            });
        }

        let mut buf =
            Vec::with_capacity(MAGIC_SIZE + VERSION_SIZE + TOTAL_LENGTH_FIELD_SIZE + total_len);

        buf.extend_from_slice(&MAGIC);
        buf.push(PROTOCOL_VERSION);
        buf.extend_from_slice(&(total_len as u32).to_be_bytes());
        buf.extend_from_slice(&(header_bytes.len() as u32).to_be_bytes());
        buf.extend_from_slice(&header_bytes);
        buf.extend_from_slice(&message.data);

        Ok(buf)
    }

    /// Reads exactly one frame from `reader`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` for a complete frame.
    /// - `Ok(None)` if the stream ended cleanly before the first byte of a frame.
    /// - `Err(ProtocolError::Truncated)` if it ended anywhere inside a frame.
    /// - Other `ProtocolError`s for bad magic, impossible lengths or a
    ///   malformed header.
    pub async fn decode_message<R>(&self, reader: &mut R) -> Result<Option<Message>, ProtocolError>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let mut magic = [0u8; MAGIC_SIZE];
        if reader.read(&mut magic[..1]).await? == 0 {
            return Ok(None);
        }
        read_full(reader, &mut magic[1..]).await?;
        check_magic(&magic)?;

        let mut prefix = [0u8; VERSION_SIZE + TOTAL_LENGTH_FIELD_SIZE];
        read_full(reader, &mut prefix).await?;
        // prefix[0] is the version byte; only version 0 exists so far.
        let total_len = read_u32_be(&prefix[VERSION_SIZE..]) as usize;
        check_total_length(total_len)?;

        let mut body = vec![0u8; total_len];
        read_full(reader, &mut body).await?;

        split_frame_body(body).map(Some)
    }

    /// Decodes a complete frame already held in memory.
    ///
    /// Trailing bytes past the announced `total-length` are rejected.
    pub fn decode_frame(&self, buf: &[u8]) -> Result<Message, ProtocolError> {
        let prefix_size = MAGIC_SIZE + VERSION_SIZE + TOTAL_LENGTH_FIELD_SIZE;
        if buf.len() < MAGIC_SIZE {
            return Err(ProtocolError::Truncated);
        }
        check_magic(&buf[..MAGIC_SIZE])?;

        if buf.len() < prefix_size {
            return Err(ProtocolError::Truncated);
        }
        let total_len = read_u32_be(&buf[MAGIC_SIZE + VERSION_SIZE..prefix_size]) as usize;
        check_total_length(total_len)?;

        match buf.len() - prefix_size {
            n if n < total_len => Err(ProtocolError::Truncated),
            n if n > total_len => Err(ProtocolError::InvalidLength(n)),
            _ => split_frame_body(buf[prefix_size..].to_vec()),
        }
    }
}

fn check_magic(bytes: &[u8]) -> Result<(), ProtocolError> {
    if bytes[0] == MAGIC[0] && bytes[1] == MAGIC[1] {
        Ok(())
    } else {
        Err(ProtocolError::BadMagic(bytes[0], bytes[1]))
    }
}

fn check_total_length(total_len: usize) -> Result<(), ProtocolError> {
    if total_len < HEADER_LENGTH_FIELD_SIZE {
        return Err(ProtocolError::InvalidLength(total_len));
    }
    if total_len > MAX_FRAME_LENGTH {
        return Err(ProtocolError::FrameTooLarge {
            size: total_len,
            max: MAX_FRAME_LENGTH,
        });
    }
    Ok(())
}

/// Splits the length-counted region into header and body.
fn split_frame_body(mut body: Vec<u8>) -> Result<Message, ProtocolError> {
    let header_len = read_u32_be(&body[..HEADER_LENGTH_FIELD_SIZE]) as usize;
    let available = body.len() - HEADER_LENGTH_FIELD_SIZE;
    if header_len > available {
        return Err(ProtocolError::InvalidHeaderLength {
            header_len,
            available,
        });
    }

    let header_end = HEADER_LENGTH_FIELD_SIZE + header_len;
    let header = Header::from_bytes(&body[HEADER_LENGTH_FIELD_SIZE..header_end])?;
    let data = body.split_off(header_end);

    Ok(Message { header, data })
}

fn read_u32_be(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(raw)
}

async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin + Send + ?Sized,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(ProtocolError::Truncated),
        Err(e) => Err(ProtocolError::Io(e)),
    }
}
