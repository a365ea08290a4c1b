use domain::{Message, MessageKind, Participant, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_status: Timestamp,
}

impl From<&Participant> for ParticipantDto {
    fn from(participant: &Participant) -> Self {
        Self {
            name: participant.name.as_str().to_owned(),
            last_status: participant.last_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(with = "time::serde::rfc3339")]
    pub time: Timestamp,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            from: message.from.as_str().to_owned(),
            to: message.to.as_str().to_owned(),
            text: message.text.as_str().to_owned(),
            kind: message.kind,
            time: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{MessageId, ParticipantName};
    use time::macros::datetime;

    #[test]
    fn message_dto_uses_wire_field_names() {
        let alice = ParticipantName::parse("alice").unwrap();
        let message = Message::joined(MessageId::generate(), &alice, datetime!(2024-05-01 10:00:00 UTC));

        let json = serde_json::to_value(MessageDto::from(&message)).unwrap();
        assert_eq!(json["from"], "alice");
        assert_eq!(json["to"], "Todos");
        assert_eq!(json["type"], "status");
        assert_eq!(json["time"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn participant_dto_serializes_last_status_in_camel_case() {
        let participant = Participant::join(
            ParticipantName::parse("bob").unwrap(),
            datetime!(2024-05-01 10:00:00 UTC),
        );
        let json = serde_json::to_value(ParticipantDto::from(&participant)).unwrap();
        assert_eq!(json["name"], "bob");
        assert_eq!(json["lastStatus"], "2024-05-01T10:00:00Z");
    }
}
