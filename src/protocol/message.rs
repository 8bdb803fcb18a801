use crate::protocol::{Header, MessageType, StatusCode};

/// The unit of wire exchange: a header plus an opaque, codec-produced body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(header: Header, data: Vec<u8>) -> Self {
        Self { header, data }
    }

    /// Builds the response skeleton for this request.
    ///
    /// The header is cloned so `seq`, service and method names (and metadata)
    /// match the request; only the kind and status change. The body is empty
    /// until the dispatcher fills it in.
    pub fn to_response(&self) -> Message {
        let mut header = self.header.clone();
        header.message_type = MessageType::Response;
        header.status_code = StatusCode::Ok;
        header.error.clear();

        Message {
            header,
            data: Vec::new(),
        }
    }

    /// Turns this message into an error response carrying `error`.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.header.status_code = StatusCode::Error;
        self.header.error = error.into();
        self.data.clear();
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.header.status_code = StatusCode::Ok;
        self.data = data;
        self
    }
}
