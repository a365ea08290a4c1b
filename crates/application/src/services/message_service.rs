use std::sync::Arc;

use domain::{
    DomainError, Message, MessageBody, MessageId, MessageLimit, Participant, ParticipantName,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository},
};

#[derive(Debug, Clone)]
pub struct PostMessageRequest {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub id: MessageId,
    pub author: String,
    pub to: String,
    pub text: String,
    pub kind: String,
}

pub struct MessageServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    // 名字不合法的请求者等同于不在房间里
    async fn find_participant(&self, raw: &str) -> Result<Option<Participant>, ApplicationError> {
        let Ok(name) = ParticipantName::parse(raw) else {
            return Ok(None);
        };
        Ok(self.deps.participant_repository.find(&name).await?)
    }

    // 通知消息不属于任何参与者，一律不可修改
    async fn load_changeable_message(&self, id: MessageId) -> Result<Message, ApplicationError> {
        let message = self
            .deps
            .message_repository
            .find_by_id(id)
            .await?
            .ok_or(DomainError::MessageNotFound)?;
        if message.is_notice() {
            return Err(DomainError::NoticeImmutable.into());
        }
        Ok(message)
    }

    /// 发送公开或私聊消息。
    ///
    /// 发送者在这次检查之后仍可能被清理任务移出房间，消息照常保存。
    pub async fn post_message(
        &self,
        request: PostMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let body = MessageBody::parse(request.to, request.text, &request.kind)?;
        let sender = self
            .find_participant(&request.from)
            .await?
            .ok_or(DomainError::SenderNotRegistered)?;

        let message = Message::new(
            MessageId::generate(),
            sender.name,
            body,
            self.deps.clock.now(),
        );
        Ok(self.deps.message_repository.create(message).await?)
    }

    /// 返回 viewer 可见的消息，从新到旧，`limit` 限制条数。
    pub async fn list_visible_messages(
        &self,
        viewer: &str,
        limit: Option<MessageLimit>,
    ) -> Result<Vec<Message>, ApplicationError> {
        let viewer = self
            .find_participant(viewer)
            .await?
            .ok_or(DomainError::ViewerNotRegistered)?;

        Ok(self
            .deps
            .message_repository
            .list_visible(&viewer.name, limit)
            .await?)
    }

    pub async fn edit_message(
        &self,
        request: EditMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let body = MessageBody::parse(request.to, request.text, &request.kind)?;
        let author = self
            .find_participant(&request.author)
            .await?
            .ok_or(DomainError::SenderNotRegistered)?;

        let mut message = self.load_changeable_message(request.id).await?;
        if !message.is_authored_by(&author.name) {
            return Err(DomainError::NotMessageAuthor.into());
        }

        message.edit(body);
        Ok(self.deps.message_repository.update(message).await?)
    }

    pub async fn delete_message(&self, id: MessageId, author: &str) -> Result<(), ApplicationError> {
        let message = self.load_changeable_message(id).await?;

        let is_author = ParticipantName::parse(author)
            .map(|name| message.is_authored_by(&name))
            .unwrap_or(false);
        if !is_author {
            return Err(DomainError::NotMessageAuthor.into());
        }

        self.deps.message_repository.delete(id).await?;
        tracing::debug!(message_id = %id, "message deleted");
        Ok(())
    }
}
