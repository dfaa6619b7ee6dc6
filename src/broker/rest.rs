use crate::{Error, ErrorKind, Result};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
    Other,
}

impl StatusClass {
    pub fn from_code(code: u16) -> Self {
        match code {
            200..=299 => StatusClass::Success,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }
}

/// Raw outcome of one broker call. The body is kept verbatim so error payloads
/// reach the operator unchanged.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub code: u16,
    pub class: StatusClass,
    pub body: String,
}

impl ApiResponse {
    pub fn new(code: u16, body: impl Into<String>) -> Self {
        Self {
            code,
            class: StatusClass::from_code(code),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.class == StatusClass::Success
    }

    /// Fails with `kind` carrying the raw body unless the status is 2xx.
    pub fn require_success(self, kind: ErrorKind, context: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(Error::with_kind(
            kind,
            format!("{context} (status {}): {}", self.code, self.body),
        ))
    }

    pub fn json(&self) -> Result<Value> {
        serde_json::from_str::<Value>(&self.body)
            .map_err(|err| Error::with_kind(ErrorKind::Parse, format!("json parse failed: {err}")))
    }
}

pub fn build_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<String>>()
        .join("&")
}

pub fn value_to_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| Error::with_kind(ErrorKind::Parse, "number is not f64")),
        Value::String(text) => text
            .parse::<f64>()
            .map_err(|err| Error::with_kind(ErrorKind::Parse, format!("invalid f64: {err}"))),
        _ => Err(Error::with_kind(
            ErrorKind::Parse,
            "unexpected value type for f64",
        )),
    }
}

pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
