use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Empty ids count as missing, the same as absent ones.
            pub fn is_missing(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

id_newtype!(ServerId);
id_newtype!(SessionId);
id_newtype!(ClientId);
id_newtype!(MessageId);

/// Returns the id only when it is present and non-empty.
pub fn present<T>(id: Option<&T>) -> Option<&T>
where
    T: AsRef<str>,
{
    id.filter(|id| !id.as_ref().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: ServerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerTokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<Value>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single search hit as returned by the backend. Only `_id` is typed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MessageRecord {
    pub fn with_id(id: impl Into<MessageId>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Map::new(),
        }
    }
}

/// User input attached to the turn in progress.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatSource {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chat {
    #[serde(rename = "_id", default)]
    pub id: SessionId,
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ChatSource>,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chat {
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_messages(mut self, messages: Vec<MessageRecord>) -> Self {
        self.messages = messages;
        self
    }

    /// Projects the chat into a message record, dropping its own message list.
    pub fn to_record(&self) -> MessageRecord {
        let mut fields = self.extra.clone();
        if let Some(source) = &self.source {
            fields.insert(
                "_source".to_string(),
                serde_json::json!({ "message": source.message }),
            );
        }
        MessageRecord {
            id: (!self.id.is_missing()).then(|| MessageId(self.id.0.clone())),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetResponsePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply of the `new_chat` command. Only `_id` and `payload.id` are read;
/// everything else rides along untyped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(rename = "_id", default)]
    pub id: SessionId,
    /// Backend session document. The client replaces it with the user input.
    #[serde(rename = "_source", default, skip_serializing)]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<GetResponsePayload>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GetResponse {
    pub fn payload_id(&self) -> Option<MessageId> {
        self.payload.as_ref().and_then(|payload| payload.id.clone())
    }
}

impl From<GetResponse> for Chat {
    fn from(value: GetResponse) -> Self {
        let mut extra = value.extra;
        if let Some(payload) = value.payload {
            if let Ok(payload) = serde_json::to_value(payload) {
                extra.insert("payload".to_string(), payload);
            }
        }
        Self {
            id: value.id,
            source: None,
            messages: Vec::new(),
            extra,
        }
    }
}
