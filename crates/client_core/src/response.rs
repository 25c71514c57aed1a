//! Decoding of backend replies.
//!
//! Structured endpoints hand back JSON that maps straight onto a typed value.
//! The history and chat lifecycle endpoints instead wrap their payload in a
//! JSON string, which needs a second parse; [`RawJson`] is that string and
//! [`RawJson::parse`] is the one place the second parse happens.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::MessageRecord,
    protocol::{Command, SearchResponse},
};

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawJson(pub String);

impl RawJson {
    pub fn from_reply(value: Value) -> Self {
        match value {
            Value::String(raw) => Self(raw),
            // An absent reply parses like an empty string, i.e. it fails.
            Value::Null => Self(String::new()),
            other => Self(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, CommandError> {
        serde_json::from_str(&self.0).map_err(|source| CommandError::Parse { source })
    }

    pub fn value(&self) -> Result<Value, CommandError> {
        self.parse()
    }

    /// `hits.hits` of a search-shaped reply; either level may be absent and
    /// a reply that is not an object reads as no hits.
    pub fn hits(&self) -> Result<Vec<MessageRecord>, CommandError> {
        match self.value()? {
            reply @ Value::Object(_) => serde_json::from_value::<SearchResponse>(reply)
                .map(SearchResponse::into_hits)
                .map_err(|source| CommandError::Parse { source }),
            _ => Ok(Vec::new()),
        }
    }

    /// A bare array of records; `null` reads as no records.
    pub fn records(&self) -> Result<Vec<MessageRecord>, CommandError> {
        Ok(self
            .parse::<Option<Vec<MessageRecord>>>()?
            .unwrap_or_default())
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    command: Command,
    value: Value,
) -> Result<T, CommandError> {
    serde_json::from_value(value).map_err(|source| CommandError::Decode { command, source })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shared::domain::MessageId;

    use super::*;

    #[test]
    fn string_reply_is_kept_verbatim() {
        let raw = RawJson::from_reply(json!(r#"{"hits":{"hits":[{"_id":"h1"}]}}"#));
        let hits = raw.hits().expect("hits");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, Some(MessageId::from("h1")));
    }

    #[test]
    fn null_reply_fails_to_parse() {
        let raw = RawJson::from_reply(Value::Null);
        assert!(matches!(raw.value(), Err(CommandError::Parse { .. })));
    }

    #[test]
    fn structured_reply_is_reencoded() {
        let raw = RawJson::from_reply(json!([{"_id": "m2"}]));
        let records = raw.records().expect("records");
        assert_eq!(records[0].id, Some(MessageId::from("m2")));
    }

    #[test]
    fn null_record_list_is_empty() {
        assert!(RawJson("null".into()).records().expect("records").is_empty());
    }

    #[test]
    fn null_or_scalar_search_reply_has_no_hits() {
        assert!(RawJson("null".into()).hits().expect("null").is_empty());
        assert!(RawJson("42".into()).hits().expect("scalar").is_empty());
    }

    #[test]
    fn malformed_string_is_a_parse_error() {
        assert!(matches!(
            RawJson("not json".into()).hits(),
            Err(CommandError::Parse { .. })
        ));
    }

    #[test]
    fn typed_decode_names_the_command() {
        let err = decode::<Vec<String>>(Command::ListCocoServers, json!({"oops": 1}))
            .expect_err("shape mismatch");
        assert!(err.to_string().contains("list_coco_servers"));
    }
}
