//! Wire frames.
//!
//! ```text
//! request: {"type": "OS_RPC", "id": "<call id>", "role": "app->os", "method": "...", "params": ...}
//! reply:   {"type": "OS_RPC", "id": "<call id>", "role": "os->app", "result": ...}
//!          {"type": "OS_RPC", "id": "<call id>", "role": "os->app", "error": {"code": "...", "message": "..."}}
//! ```
//!
//! A reply carries exactly one of `result` or `error`. `params` may be
//! omitted and then reads as `null`.

use serde_json::{Map, Value};
use webdesk_core::{CallId, RpcError};

use crate::error::{FrameError, FrameResult};

/// Protocol tag carried in the `type` field of every frame.
pub const PROTOCOL_TAG: &str = "OS_RPC";

/// Direction marker of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Process to host (a call).
    Request,
    /// Host to process (the answer to a call).
    Reply,
}

impl Role {
    /// The wire spelling of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "app->os",
            Self::Reply => "os->app",
        }
    }

    fn parse(raw: &str) -> FrameResult<Self> {
        match raw {
            "app->os" => Ok(Self::Request),
            "os->app" => Ok(Self::Reply),
            other => Err(FrameError::UnknownRole(other.to_owned())),
        }
    }
}

/// A call issued by a process.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id chosen by the caller.
    pub id: CallId,
    /// Method name, e.g. `storage.get`.
    pub method: String,
    /// Method parameters, `null` when omitted.
    pub params: Value,
}

impl Request {
    /// The namespace prefix of the method (`storage` for `storage.get`).
    ///
    /// Methods without a dot have no namespace.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.method.split_once('.').map(|(ns, _)| ns)
    }

    /// Look up a named parameter. Absent when params is not an object.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.as_object().and_then(|p| p.get(name))
    }
}

/// The single answer to a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Correlation id copied from the request.
    pub id: CallId,
    /// Result payload or structured error.
    pub outcome: Result<Value, RpcError>,
}

/// A decoded protocol frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Process to host.
    Request(Request),
    /// Host to process.
    Reply(Reply),
}

impl Frame {
    /// Build a request frame.
    #[must_use]
    pub fn request(id: CallId, method: impl Into<String>, params: Value) -> Self {
        Self::Request(Request {
            id,
            method: method.into(),
            params,
        })
    }

    /// Build a reply frame.
    #[must_use]
    pub fn reply(id: CallId, outcome: Result<Value, RpcError>) -> Self {
        Self::Reply(Reply { id, outcome })
    }

    /// The frame's role marker.
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Request(_) => Role::Request,
            Self::Reply(_) => Role::Reply,
        }
    }

    /// The frame's correlation id.
    #[must_use]
    pub fn id(&self) -> &CallId {
        match self {
            Self::Request(r) => &r.id,
            Self::Reply(r) => &r.id,
        }
    }

    /// Decode a raw JSON value.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the value does not carry the protocol
    /// tag, has an unknown role, or its shape does not fit its role.
    pub fn decode(raw: &Value) -> FrameResult<Self> {
        let obj = raw.as_object().ok_or(FrameError::NotAnObject)?;

        if obj.get("type").and_then(Value::as_str) != Some(PROTOCOL_TAG) {
            return Err(FrameError::WrongTag);
        }
        let role = match obj.get("role") {
            Some(Value::String(role)) => Role::parse(role)?,
            Some(_) => return Err(FrameError::InvalidField("role")),
            None => return Err(FrameError::MissingField("role")),
        };
        let id = match obj.get("id") {
            Some(Value::String(id)) if !id.is_empty() => CallId::from(id.as_str()),
            Some(_) => return Err(FrameError::InvalidField("id")),
            None => return Err(FrameError::MissingField("id")),
        };

        match role {
            Role::Request => {
                let method = match obj.get("method") {
                    Some(Value::String(m)) if !m.is_empty() => m.clone(),
                    Some(_) => return Err(FrameError::InvalidField("method")),
                    None => return Err(FrameError::MissingField("method")),
                };
                let params = obj.get("params").cloned().unwrap_or(Value::Null);
                Ok(Self::request(id, method, params))
            },
            Role::Reply => {
                let outcome = match (obj.get("result"), obj.get("error")) {
                    (Some(result), None) => Ok(result.clone()),
                    (None, Some(error)) => Err(serde_json::from_value::<RpcError>(error.clone())
                        .map_err(|_| FrameError::InvalidField("error"))?),
                    (Some(_), Some(_)) => return Err(FrameError::InvalidField("result")),
                    (None, None) => return Err(FrameError::MissingField("result")),
                };
                Ok(Self::reply(id, outcome))
            },
        }
    }

    /// Encode to the wire representation.
    #[must_use]
    pub fn encode(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::from(PROTOCOL_TAG));
        obj.insert("id".into(), Value::from(self.id().as_str()));
        obj.insert("role".into(), Value::from(self.role().as_str()));
        match self {
            Self::Request(r) => {
                obj.insert("method".into(), Value::from(r.method.as_str()));
                obj.insert("params".into(), r.params.clone());
            },
            Self::Reply(r) => match &r.outcome {
                Ok(result) => {
                    obj.insert("result".into(), result.clone());
                },
                Err(error) => {
                    obj.insert(
                        "error".into(),
                        serde_json::json!({"code": error.code.as_str(), "message": error.message}),
                    );
                },
            },
        }
        Value::Object(obj)
    }
}
