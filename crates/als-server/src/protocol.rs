//! JSON-RPC 2.0 message model and classification.

use std::fmt;

use serde_json::{Value, json};

pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// A request id: integer, string, or null.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

impl RequestId {
    /// Extract an id from a JSON value. Anything other than an integer,
    /// string, or null is rejected.
    pub fn from_value(value: &Value) -> Option<RequestId> {
        match value {
            Value::Number(n) => n.as_i64().map(RequestId::Number),
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Null => Some(RequestId::Null),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestId::Number(n) => json!(n),
            RequestId::String(s) => json!(s),
            RequestId::Null => Value::Null,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "\"{s}\""),
            RequestId::Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub id: RequestId,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone)]
pub enum Message {
    Request(Request),
    Notification(Notification),
    Response {
        id: RequestId,
        result: Value,
    },
    ErrorResponse {
        id: RequestId,
        code: i64,
        message: String,
        data: Value,
    },
}

/// A frame that parsed as JSON but is not a well-formed JSON-RPC message.
/// `id` is whatever id could be recovered from the broken envelope.
#[derive(Debug, Clone)]
pub struct InvalidMessage {
    pub id: Option<RequestId>,
    pub reason: String,
}

impl Message {
    /// Classify a parsed JSON value per JSON-RPC 2.0: the value must be an
    /// object with `jsonrpc == "2.0"` and either a string `method` or
    /// exactly one of `result`/`error`.
    pub fn classify(value: Value) -> Result<Message, InvalidMessage> {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                return Err(InvalidMessage {
                    id: None,
                    reason: "message is not an object".to_string(),
                });
            }
        };

        let id = obj.get("id").and_then(RequestId::from_value);
        let invalid = |reason: &str| InvalidMessage {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return Err(invalid("missing or wrong jsonrpc version"));
        }

        let method = obj.get("method");
        let result = obj.get("result");
        let error = obj.get("error");

        match (method, result, error) {
            (Some(method), None, None) => {
                let method = match method.as_str() {
                    Some(m) => m.to_string(),
                    None => return Err(invalid("method is not a string")),
                };
                let params = obj.get("params").cloned().unwrap_or(Value::Null);
                match (obj.contains_key("id"), id) {
                    (true, Some(id)) => Ok(Message::Request(Request { id, method, params })),
                    (true, None) => Err(InvalidMessage {
                        id: None,
                        reason: "id must be an integer, string, or null".to_string(),
                    }),
                    (false, _) => Ok(Message::Notification(Notification { method, params })),
                }
            }
            (None, Some(result), None) => Ok(Message::Response {
                id: id.unwrap_or(RequestId::Null),
                result: result.clone(),
            }),
            (None, None, Some(error)) => {
                let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let data = error.get("data").cloned().unwrap_or(Value::Null);
                Ok(Message::ErrorResponse {
                    id: id.unwrap_or(RequestId::Null),
                    code,
                    message,
                    data,
                })
            }
            (None, None, None) => Err(invalid("missing method, result, and error")),
            _ => Err(invalid("method, result, and error are mutually exclusive")),
        }
    }
}

/// Build a success response envelope.
pub fn response(id: &RequestId, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id.to_value(),
        "result": result,
    })
}

/// Build an error response envelope. `data` is omitted when null.
pub fn error_response(id: &RequestId, code: i64, message: &str, data: Value) -> Value {
    let mut error = json!({
        "code": code,
        "message": message,
    });
    if !data.is_null() {
        error["data"] = data;
    }
    json!({
        "jsonrpc": "2.0",
        "id": id.to_value(),
        "error": error,
    })
}
