//! Inbound realtime messages.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::error::ConsoleError;

/// Mutation announced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CityAdded,
    CityUpdated,
    CityDeleted,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::CityAdded,
        EventKind::CityUpdated,
        EventKind::CityDeleted,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            EventKind::CityAdded => "CITY_ADDED",
            EventKind::CityUpdated => "CITY_UPDATED",
            EventKind::CityDeleted => "CITY_DELETED",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        EventKind::ALL.into_iter().find(|k| k.wire_name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeEvent {
    pub kind: EventKind,
    pub data: Value,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Parse a `{type, data}` frame.
///
/// `Ok(None)` for a well-formed message of a type nobody listens to;
/// `Err` for anything that is not an envelope at all.
pub fn parse_message(text: &str) -> Result<Option<RealtimeEvent>, ConsoleError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| ConsoleError::Channel(format!("malformed message: {}", e)))?;

    Ok(EventKind::from_wire(&envelope.kind).map(|kind| RealtimeEvent {
        kind,
        data: envelope.data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_type() {
        let event = parse_message(r#"{"type":"CITY_DELETED","data":{"id":7}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, EventKind::CityDeleted);
        assert_eq!(event.data, json!({"id": 7}));
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        assert_eq!(parse_message(r#"{"type":"PING"}"#).unwrap(), None);
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(parse_message("not json").is_err());
        assert!(parse_message(r#"{"data":1}"#).is_err());
        assert!(parse_message("[1,2]").is_err());
    }
}
