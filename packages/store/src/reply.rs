//! Resolved outcome of a store request.

use jsonstore_http::{HttpResponse, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ReplyError;

/// What a store request resolved to.
///
/// Remote failures are values, not errors: both the sync and async forms
/// of every operation resolve to a `Reply`.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The value read, the content accepted by a write, or `true` for a delete.
    Value(Value),
    /// Nothing is stored at the path.
    NotFound,
    /// Network, HTTP or service failure.
    Failure(String),
}

impl Reply {
    pub fn is_value(&self) -> bool {
        matches!(self, Reply::Value(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Reply::NotFound)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failure(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Reply::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Reply::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Decode a stored value into `T`. `NotFound` decodes to `None`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Option<T>, ReplyError> {
        match self {
            Reply::Value(v) => Ok(Some(serde_json::from_value(v)?)),
            Reply::NotFound => Ok(None),
            Reply::Failure(message) => Err(ReplyError::Failure(message)),
        }
    }

    /// The legacy single-channel form: the value, `false`, or the message.
    ///
    /// Callers distinguish the three by JSON type, so a stored `false` or
    /// string is ambiguous here. Prefer matching on `Reply` directly.
    pub fn into_legacy(self) -> Value {
        match self {
            Reply::Value(v) => v,
            Reply::NotFound => Value::Bool(false),
            Reply::Failure(message) => Value::String(message),
        }
    }

    pub fn to_legacy(&self) -> Value {
        self.clone().into_legacy()
    }

    /// Interpret a response to a `method` request.
    ///
    /// `sent` is the content of a PUT or POST, echoed back when the service
    /// does not return the stored value itself.
    pub(crate) fn from_response(
        method: Method,
        response: &HttpResponse,
        sent: Option<&Value>,
    ) -> Reply {
        if response.is_not_found() {
            return Reply::NotFound;
        }

        if !response.is_success() {
            return Reply::Failure(status_failure(response));
        }

        let envelope = Envelope::parse(&response.body);
        if let Some(Envelope { ok: false, error, .. }) = envelope {
            return Reply::Failure(error.unwrap_or_else(|| "request rejected".to_string()));
        }

        match method {
            Method::DELETE => Reply::Value(Value::Bool(true)),
            Method::PUT | Method::POST => {
                let accepted = envelope
                    .and_then(|e| e.result)
                    .or_else(|| sent.cloned())
                    .unwrap_or(Value::Null);
                Reply::Value(accepted)
            }
            Method::GET => {
                if response.body.is_null() {
                    if let Some(text) = response.text().filter(|t| *t != "null") {
                        return Reply::Failure(format!("response is not valid JSON: {text}"));
                    }
                    return Reply::NotFound;
                }

                let result = match envelope {
                    Some(e) => e.result,
                    None => Some(response.body.clone()),
                };
                match result {
                    Some(v) => Reply::Value(v),
                    None => Reply::NotFound,
                }
            }
        }
    }
}

impl From<Reply> for Value {
    fn from(reply: Reply) -> Self {
        reply.into_legacy()
    }
}

/// The service's `{"ok": bool, "result": .., "error": ..}` response shape.
struct Envelope {
    ok: bool,
    /// `None` when absent or `null`.
    result: Option<Value>,
    error: Option<String>,
}

impl Envelope {
    fn parse(body: &Value) -> Option<Envelope> {
        let object = body.as_object()?;
        let ok = object.get("ok")?.as_bool()?;
        let result = object.get("result").filter(|v| !v.is_null()).cloned();
        let error = object.get("error").map(|e| match e {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        Some(Envelope { ok, result, error })
    }
}

fn status_failure(response: &HttpResponse) -> String {
    let detail = Envelope::parse(&response.body)
        .and_then(|e| e.error)
        .or_else(|| response.text().map(str::to_string));

    match detail {
        Some(detail) => format!(
            "HTTP {} {}: {}",
            response.status, response.status_text, detail
        ),
        None => format!("HTTP {} {}", response.status, response.status_text),
    }
}
