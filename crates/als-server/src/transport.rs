//! Content-Length framed reader/writer over arbitrary byte streams.
//!
//! Framing is HTTP-style: header lines, a blank line, then exactly
//! `Content-Length` bytes of UTF-8 JSON. Header lines may end in CRLF or
//! bare LF. The payload is never line-ending translated.

use std::io::{BufRead, Read, Write};
use std::sync::Mutex;

use serde_json::Value;

use als_core::AlsError;

use crate::protocol::{self, Message, RequestId, error_codes};

/// Hard cap on a single message payload.
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

struct WriterState {
    stream: Box<dyn Write + Send>,
    connected: bool,
}

/// Thread-safe framed writer. Concurrent replies are serialized by the
/// internal mutex so frames never interleave on the wire. After a write
/// failure the connection is marked closed and further writes are no-ops.
pub struct MessageWriter {
    state: Mutex<WriterState>,
}

impl MessageWriter {
    pub fn new(stream: Box<dyn Write + Send>) -> Self {
        MessageWriter {
            state: Mutex::new(WriterState {
                stream,
                connected: true,
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().map(|s| s.connected).unwrap_or(false)
    }

    pub fn disconnect(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.connected = false;
        }
    }

    /// Serialize `value` compactly and write one frame.
    pub fn write_value(&self, value: &Value) -> Result<(), AlsError> {
        let payload = serde_json::to_string(value).map_err(|e| AlsError::invalid_json(e.to_string()))?;

        let mut state = self
            .state
            .lock()
            .map_err(|_| AlsError::Io("writer lock poisoned".to_string()))?;
        if !state.connected {
            return Ok(());
        }

        let frame = format!("Content-Length: {}\r\n\r\n{payload}", payload.len());
        let result = state
            .stream
            .write_all(frame.as_bytes())
            .and_then(|_| state.stream.flush());
        if let Err(e) = result {
            log::error!("write failed, closing connection: {e}");
            state.connected = false;
            return Err(AlsError::ConnectionClosed);
        }
        Ok(())
    }

    pub fn write_response(&self, id: &RequestId, result: Value) -> Result<(), AlsError> {
        self.write_value(&protocol::response(id, result))
    }

    pub fn write_error(
        &self,
        id: &RequestId,
        code: i64,
        message: &str,
        data: Value,
    ) -> Result<(), AlsError> {
        self.write_value(&protocol::error_response(id, code, message, data))
    }

    pub fn write_parse_error(&self, message: &str) -> Result<(), AlsError> {
        self.write_error(
            &RequestId::Null,
            error_codes::PARSE_ERROR,
            &format!("Parse error: {message}"),
            Value::Null,
        )
    }
}

/// Framed reader half of a connection. Owned by the single read loop.
pub struct MessageReader {
    stream: Box<dyn BufRead + Send>,
}

impl MessageReader {
    pub fn new(stream: Box<dyn BufRead + Send>) -> Self {
        MessageReader { stream }
    }

    /// Read one raw frame. `Ok(None)` is a clean EOF at a frame boundary;
    /// EOF with headers pending or mid-payload is `ConnectionClosed`.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, AlsError> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_header = false;

        loop {
            line.clear();
            let n = self.stream.read_line(&mut line)?;
            if n == 0 {
                if saw_header {
                    return Err(AlsError::ConnectionClosed);
                }
                return Ok(None);
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                break;
            }
            saw_header = true;

            if let Some(rest) = trimmed.strip_prefix("Content-Length:") {
                let value = rest.trim();
                content_length = Some(value.parse::<usize>().map_err(|_| {
                    AlsError::invalid_header(format!("bad Content-Length: {value:?}"))
                })?);
            }
        }

        let length = match content_length {
            Some(n) => n,
            None => return Err(AlsError::invalid_header("missing Content-Length")),
        };
        if length == 0 {
            return Err(AlsError::invalid_header("zero Content-Length"));
        }
        if length > MAX_MESSAGE_SIZE {
            return Err(AlsError::OversizedMessage {
                size: length,
                limit: MAX_MESSAGE_SIZE,
            });
        }

        let mut payload = vec![0u8; length];
        self.stream.read_exact(&mut payload)?;
        Ok(Some(payload))
    }

    /// Read frames until one classifies as a JSON-RPC message. Parse and
    /// shape errors are reported to the peer through `writer` and the loop
    /// continues; only transport failures end the stream.
    pub fn read_message(&mut self, writer: &MessageWriter) -> Result<Option<Message>, AlsError> {
        loop {
            let payload = match self.read_frame()? {
                Some(payload) => payload,
                None => return Ok(None),
            };

            let value: Value = match serde_json::from_slice(&payload) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("discarding unparseable payload: {e}");
                    let _ = writer.write_parse_error(&e.to_string());
                    continue;
                }
            };

            match Message::classify(value) {
                Ok(message) => return Ok(Some(message)),
                Err(invalid) => {
                    log::warn!("discarding invalid JSON-RPC message: {}", invalid.reason);
                    match invalid.id {
                        Some(id) => {
                            let _ = writer.write_error(
                                &id,
                                error_codes::INVALID_REQUEST,
                                "Invalid Request",
                                serde_json::json!({ "reason": invalid.reason }),
                            );
                        }
                        None => {
                            let _ = writer.write_parse_error(&invalid.reason);
                        }
                    }
                    continue;
                }
            }
        }
    }
}
