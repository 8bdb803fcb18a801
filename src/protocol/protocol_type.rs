use crate::protocol::{Message, ProtocolError, RpcProtocol};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use tokio::io::AsyncRead;

/// Selects the framing used on a connection.
#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum ProtocolType {
    #[default]
    Default = 0,
}

impl ProtocolType {
    pub fn encode_message(self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        match self {
            ProtocolType::Default => RpcProtocol.encode_message(message),
        }
    }

    pub async fn decode_message<R>(self, reader: &mut R) -> Result<Option<Message>, ProtocolError>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        match self {
            ProtocolType::Default => RpcProtocol.decode_message(reader).await,
        }
    }
}
