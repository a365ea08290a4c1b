use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{MessageId, MessageText, ParticipantName, Recipient, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// 系统生成的进入/离开通知
    Status,
    /// 公开消息
    Message,
    /// 私聊消息，只有发送者和接收者可见
    PrivateMessage,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Status => "status",
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
        }
    }

    /// `status` 和 `message` 对所有人可见
    pub fn is_public(&self) -> bool {
        matches!(self, MessageKind::Status | MessageKind::Message)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(MessageKind::Status),
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            other => Err(DomainError::invalid_argument(
                "type",
                format!("unknown message type `{other}`"),
            )),
        }
    }
}

/// 参与者可以提交的消息内容（发送和编辑共用）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    pub to: Recipient,
    pub text: MessageText,
    pub kind: MessageKind,
}

impl MessageBody {
    /// 校验客户端提交的 `to`/`text`/`type`，`status` 只能由系统生成。
    pub fn parse(
        to: impl Into<String>,
        text: impl Into<String>,
        kind: &str,
    ) -> Result<Self, DomainError> {
        let kind = kind.parse::<MessageKind>()?;
        if kind == MessageKind::Status {
            return Err(DomainError::invalid_argument(
                "type",
                "must be message or private_message",
            ));
        }
        Ok(Self {
            to: Recipient::parse(to)?,
            text: MessageText::parse(text)?,
            kind,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub from: ParticipantName,
    pub to: Recipient,
    pub text: MessageText,
    pub kind: MessageKind,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        id: MessageId,
        from: ParticipantName,
        body: MessageBody,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            from,
            to: body.to,
            text: body.text,
            kind: body.kind,
            created_at,
        }
    }

    /// 参与者进入房间的通知
    pub fn joined(id: MessageId, name: &ParticipantName, at: Timestamp) -> Self {
        Self::notice(id, name, format!("{name} entrou na sala..."), at)
    }

    /// 参与者被清理出房间的通知
    pub fn left(id: MessageId, name: &ParticipantName, at: Timestamp) -> Self {
        Self::notice(id, name, format!("{name} sai da sala..."), at)
    }

    fn notice(id: MessageId, name: &ParticipantName, text: String, at: Timestamp) -> Self {
        Self {
            id,
            from: name.clone(),
            to: Recipient::broadcast(),
            text: MessageText(text),
            kind: MessageKind::Status,
            created_at: at,
        }
    }

    /// 替换接收者、正文和类型，创建时间保持不变。
    pub fn edit(&mut self, body: MessageBody) {
        self.to = body.to;
        self.text = body.text;
        self.kind = body.kind;
    }

    /// 进入/离开通知
    pub fn is_notice(&self) -> bool {
        self.kind == MessageKind::Status
    }

    pub fn is_authored_by(&self, name: &ParticipantName) -> bool {
        &self.from == name
    }

    /// 公开消息对所有人可见；私聊只对发送者和接收者可见。
    pub fn is_visible_to(&self, viewer: &ParticipantName) -> bool {
        self.kind.is_public() || self.is_authored_by(viewer) || self.to.is(viewer)
    }
}
