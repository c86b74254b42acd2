//! Response envelope for every request crossing the process boundary.
//!
//! Wire shape is exactly one of:
//! ```json
//! {"success": true, "data": <value>}
//! {"success": false, "error": "<message>"}
//! ```

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success { data: Value },
    Failure { message: String },
}

impl Envelope {
    pub fn success(data: impl Into<Value>) -> Self {
        Envelope::Success { data: data.into() }
    }

    /// The single point where a handler outcome becomes an envelope.
    pub(crate) fn from_result(result: anyhow::Result<Value>) -> Self {
        match result {
            Ok(data) => Envelope::Success { data },
            // Alternate form keeps the whole context chain
            Err(err) => Envelope::Failure {
                message: format!("{:#}", err),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Envelope::Success { data } => Some(data),
            Envelope::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Failure { message } => Some(message),
        }
    }

    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Envelope::Success { data } => Ok(data),
            Envelope::Failure { message } => Err(message),
        }
    }

    /// JSON value in wire shape
    pub fn to_wire(&self) -> Value {
        match self {
            Envelope::Success { data } => serde_json::json!({ "success": true, "data": data }),
            Envelope::Failure { message } => {
                serde_json::json!({ "success": false, "error": message })
            }
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Envelope::Success { data } => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)?;
            }
            Envelope::Failure { message } => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", message)?;
            }
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireEnvelope::deserialize(deserializer)?;
        match (wire.success, wire.data, wire.error) {
            (true, data, None) => Ok(Envelope::Success {
                data: data.unwrap_or(Value::Null),
            }),
            (false, None, Some(message)) => Ok(Envelope::Failure { message }),
            (true, _, Some(_)) => Err(D::Error::custom("success envelope must not carry an error")),
            (false, Some(_), _) => Err(D::Error::custom("failure envelope must not carry data")),
            (false, None, None) => Err(D::Error::missing_field("error")),
        }
    }
}
