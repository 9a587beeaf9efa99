use serde::{Deserialize, Serialize};

use crate::{error::ErrorShape, events::SessionEvent};

/// Frames a WebSocket client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Attach this connection as the event subscriber for a session.
    Subscribe { session_id: String },
    /// Subscribe, then create (or re-attach to) the session.
    CreateSession { session_id: String },
    /// Tear the session down.
    Teardown { session_id: String },
}

/// Frames the gateway sends back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// Current session snapshot, sent in reply to subscribe/create.
    Status { session_id: String, state: String },
    /// A lifecycle event. For `handshake-issued` the gateway also renders
    /// the code as a scannable PNG data URL.
    Event {
        session_id: String,
        #[serde(flatten)]
        event: SessionEvent,
        #[serde(skip_serializing_if = "Option::is_none")]
        handshake_image: Option<String>,
    },
    /// Teardown acknowledgement; `removed` is false when the session was
    /// already gone.
    Teardown { session_id: String, removed: bool },
    Error {
        #[serde(flatten)]
        error: ErrorShape,
    },
}

/// Recipient lists arrive either as a JSON array or as one comma-separated
/// string; both forms are accepted for compatibility with existing clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipientInput {
    List(Vec<String>),
    Csv(String),
}

impl RecipientInput {
    /// Flatten into trimmed, non-empty entries, order preserved.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Self::Csv(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frame_round_trip() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"create-session","session_id":"u1"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::CreateSession { ref session_id } if session_id == "u1"));
    }

    #[test]
    fn event_frame_flattens() {
        let frame = ServerFrame::Event {
            session_id: "u1".into(),
            event: SessionEvent::HandshakeIssued {
                code: "xyz".into(),
            },
            handshake_image: Some("data:image/png;base64,AAAA".into()),
        };
        let v = serde_json::to_value(&frame).unwrap();
        assert_eq!(v["type"], "event");
        assert_eq!(v["event"], "handshake-issued");
        assert_eq!(v["code"], "xyz");
        assert!(v["handshake_image"].as_str().unwrap().starts_with("data:image/png"));
    }

    #[test]
    fn event_frame_omits_absent_image() {
        let frame = ServerFrame::Event {
            session_id: "u1".into(),
            event: SessionEvent::Ready,
            handshake_image: None,
        };
        let v = serde_json::to_value(&frame).unwrap();
        assert!(v.get("handshake_image").is_none());
    }

    #[test]
    fn recipients_from_csv() {
        let input = RecipientInput::Csv("111, 222 ,,333".into());
        assert_eq!(input.into_vec(), vec!["111", "222", "333"]);
    }

    #[test]
    fn recipients_from_list() {
        let input = RecipientInput::List(vec![" 111 ".into(), String::new(), "222".into()]);
        assert_eq!(input.into_vec(), vec!["111", "222"]);
    }

    #[test]
    fn recipients_untagged_parse() {
        let csv: RecipientInput = serde_json::from_str(r#""1,2""#).unwrap();
        assert_eq!(csv.into_vec().len(), 2);
        let list: RecipientInput = serde_json::from_str(r#"["1","2","3"]"#).unwrap();
        assert_eq!(list.into_vec().len(), 3);
    }
}
