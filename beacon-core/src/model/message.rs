use serde_json::Value;

use crate::error::ProtocolError;
use crate::model::PeerId;

/// A decoded inbound frame, classified for routing.
///
/// Relay and fallback variants keep the original text so the room
/// forwards the envelope exactly as the sender wrote it, instead of a
/// lossy re-serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `offer` / `answer` / `ice-candidate`: unicast to `target`.
    Relay { target: PeerId, raw: String },

    /// `chat`: broadcast to the whole room with the sender id attached.
    Chat { message: String },

    /// `raise-hand`: broadcast to the whole room with the sender id
    /// attached.
    RaiseHand,

    /// `set-password`: host-only, locks the room.
    SetPassword { password: String },

    /// `unlock-room`: host-only, unlocks the room.
    UnlockRoom,

    /// `kick`: host-only, removes a member and closes its connection.
    Kick { target: PeerId },

    /// Any unrecognized `type`: broadcast verbatim to everyone except
    /// the sender.
    Other { raw: String },
}

impl ClientMessage {
    /// Classifies one text frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError`] when the frame is not a JSON object,
    /// carries no `type` tag, or a recognized type is missing a
    /// required field. Unknown types are not an error; they become
    /// [`ClientMessage::Other`].
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let Some(obj) = value.as_object() else {
            return Err(ProtocolError::NotAnObject);
        };
        let Some(kind) = obj.get("type").and_then(Value::as_str) else {
            return Err(ProtocolError::MissingType);
        };

        match kind {
            "offer" | "answer" | "ice-candidate" => Ok(Self::Relay {
                target: PeerId::from(required_str(obj, "target")?),
                raw: text.to_owned(),
            }),
            "chat" => Ok(Self::Chat {
                message: required_str(obj, "message")?.to_owned(),
            }),
            "raise-hand" => Ok(Self::RaiseHand),
            // A missing password falls back to "", matching the
            // deployed clients; the lock itself is identity-gated.
            "set-password" => Ok(Self::SetPassword {
                password: obj
                    .get("password")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            }),
            "unlock-room" => Ok(Self::UnlockRoom),
            "kick" => Ok(Self::Kick {
                target: PeerId::from(required_str(obj, "kickId")?),
            }),
            _ => Ok(Self::Other {
                raw: text.to_owned(),
            }),
        }
    }
}

fn required_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ProtocolError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_offer_as_relay_and_keeps_raw_text() {
        let text = r#"{"type":"offer","target":"bob","sdp":"v=0..."}"#;
        let msg = ClientMessage::decode(text).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Relay {
                target: PeerId::from("bob"),
                raw: text.to_owned(),
            }
        );
    }

    #[test]
    fn decodes_answer_and_ice_candidate_as_relay() {
        for kind in ["answer", "ice-candidate"] {
            let text = format!(r#"{{"type":"{kind}","target":"alice"}}"#);
            let msg = ClientMessage::decode(&text).unwrap();
            assert!(matches!(msg, ClientMessage::Relay { ref target, .. }
                if *target == PeerId::from("alice")));
        }
    }

    #[test]
    fn relay_without_target_is_an_error() {
        let err =
            ClientMessage::decode(r#"{"type":"offer","sdp":"x"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField("target")));
    }

    #[test]
    fn decodes_chat() {
        let msg =
            ClientMessage::decode(r#"{"type":"chat","message":"hi"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Chat {
                message: "hi".to_owned()
            }
        );
    }

    #[test]
    fn chat_without_message_is_an_error() {
        let err = ClientMessage::decode(r#"{"type":"chat"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField("message")));
    }

    #[test]
    fn decodes_raise_hand() {
        let msg = ClientMessage::decode(r#"{"type":"raise-hand"}"#).unwrap();
        assert_eq!(msg, ClientMessage::RaiseHand);
    }

    #[test]
    fn decodes_set_password() {
        let msg =
            ClientMessage::decode(r#"{"type":"set-password","password":"s3cret"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SetPassword {
                password: "s3cret".to_owned()
            }
        );
    }

    #[test]
    fn set_password_defaults_to_empty_when_absent() {
        let msg = ClientMessage::decode(r#"{"type":"set-password"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SetPassword {
                password: String::new()
            }
        );
    }

    #[test]
    fn decodes_unlock_room() {
        let msg = ClientMessage::decode(r#"{"type":"unlock-room"}"#).unwrap();
        assert_eq!(msg, ClientMessage::UnlockRoom);
    }

    #[test]
    fn decodes_kick_from_kick_id_field() {
        let msg =
            ClientMessage::decode(r#"{"type":"kick","kickId":"mallory"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Kick {
                target: PeerId::from("mallory")
            }
        );
    }

    #[test]
    fn kick_without_kick_id_is_an_error() {
        let err = ClientMessage::decode(r#"{"type":"kick"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField("kickId")));
    }

    #[test]
    fn unknown_type_becomes_fallback_with_raw_text() {
        let text = r#"{"type":"mute-all","except":"alice"}"#;
        let msg = ClientMessage::decode(text).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Other {
                raw: text.to_owned()
            }
        );
    }

    #[test]
    fn garbage_is_a_json_error() {
        let err = ClientMessage::decode("not json at all").unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = ClientMessage::decode(r#"["type","chat"]"#).unwrap_err();
        assert!(matches!(err, ProtocolError::NotAnObject));
    }

    #[test]
    fn non_string_type_is_rejected() {
        let err = ClientMessage::decode(r#"{"type":42}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingType));
    }
}
