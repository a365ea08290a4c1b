use std::fmt;
use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = OffsetDateTime;

/// 广播消息的默认接收者。
pub const BROADCAST_RECIPIENT: &str = "Todos";

/// 消息唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<MessageId> for Uuid {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

fn non_blank(field: &str, value: impl Into<String>) -> Result<String, DomainError> {
    let value = value.into().trim().to_owned();
    if value.is_empty() {
        return Err(DomainError::invalid_argument(field, "cannot be empty"));
    }
    Ok(value)
}

/// 经过验证的参与者名字，也是参与者的唯一键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        non_blank("name", value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 消息接收者：参与者名字或广播标记 `Todos`。
///
/// 接收者不要求是当前在线的参与者。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient(String);

impl Recipient {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        non_blank("to", value).map(Self)
    }

    pub fn broadcast() -> Self {
        Self(BROADCAST_RECIPIENT.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is(&self, name: &ParticipantName) -> bool {
        self.0 == name.as_str()
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText(pub(crate) String);

impl MessageText {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        non_blank("text", value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 消息列表的条数上限，必须是正整数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MessageLimit(u32);

impl MessageLimit {
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::invalid_argument("limit", "must be positive"));
        }
        Ok(Self(value))
    }

    /// 从查询字符串解析
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        // 超出范围的正整数按最大值处理
        let value = match raw.trim().parse::<i64>() {
            Ok(value) => value,
            Err(err) if *err.kind() == IntErrorKind::PosOverflow => i64::MAX,
            Err(err) if *err.kind() == IntErrorKind::NegOverflow => i64::MIN,
            Err(_) => {
                return Err(DomainError::invalid_argument("limit", "must be an integer"));
            }
        };
        if value <= 0 {
            return Err(DomainError::invalid_argument("limit", "must be positive"));
        }
        let value = u32::try_from(value).unwrap_or(u32::MAX);
        Self::new(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_name_is_trimmed() {
        let name = ParticipantName::parse("  alice ").unwrap();
        assert_eq!(name.as_str(), "alice");
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(matches!(
            ParticipantName::parse("   "),
            Err(DomainError::InvalidArgument { field, .. }) if field == "name"
        ));
        assert!(Recipient::parse("").is_err());
        assert!(MessageText::parse("\n\t").is_err());
    }

    #[test]
    fn limit_accepts_positive_integers_only() {
        assert_eq!(MessageLimit::parse("2").unwrap().get(), 2);
        assert_eq!(MessageLimit::parse(" 10 ").unwrap().get(), 10);
        assert!(MessageLimit::parse("0").is_err());
        assert!(MessageLimit::parse("-3").is_err());
        assert!(MessageLimit::parse("abc").is_err());
        assert!(MessageLimit::parse("1.5").is_err());
        assert!(MessageLimit::new(0).is_err());
    }

    #[test]
    fn huge_limit_saturates() {
        assert_eq!(MessageLimit::parse("99999999999").unwrap().get(), u32::MAX);
        assert_eq!(
            MessageLimit::parse("99999999999999999999999").unwrap().get(),
            u32::MAX
        );
        assert!(MessageLimit::parse("-99999999999999999999999").is_err());
    }

    #[test]
    fn recipient_matches_participant_name() {
        let bob = ParticipantName::parse("bob").unwrap();
        assert!(Recipient::parse("bob").unwrap().is(&bob));
        assert!(!Recipient::broadcast().is(&bob));
        assert_eq!(Recipient::broadcast().as_str(), BROADCAST_RECIPIENT);
    }
}
