use async_trait::async_trait;
use domain::{
    Message, MessageId, MessageLimit, Participant, ParticipantName, RepositoryError, Timestamp,
};

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn exists(&self, name: &ParticipantName) -> Result<bool, RepositoryError>;
    async fn find(&self, name: &ParticipantName) -> Result<Option<Participant>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Participant>, RepositoryError>;

    // 更新心跳时间，参与者不存在时返回 false
    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> Result<bool, RepositoryError>;

    // 最近一次心跳早于 cutoff 的参与者
    async fn list_stale(&self, cutoff: Timestamp) -> Result<Vec<Participant>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError>;
    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    // viewer 可见的消息，按创建顺序从新到旧
    async fn list_visible(
        &self,
        viewer: &ParticipantName,
        limit: Option<MessageLimit>,
    ) -> Result<Vec<Message>, RepositoryError>;

    // 消息不存在时返回 RepositoryError::NotFound
    async fn update(&self, message: Message) -> Result<Message, RepositoryError>;
    async fn delete(&self, id: MessageId) -> Result<(), RepositoryError>;
}

/// 参与者生命周期变化与对应通知必须在同一个事务里落库。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// 插入参与者并写入进入通知；同名参与者已存在时返回 `RepositoryError::Conflict`
    async fn join_with_notice(
        &self,
        participant: Participant,
        notice: Message,
    ) -> Result<Participant, RepositoryError>;

    /// 参与者在提交时仍然过期才删除，并写入离开通知。
    ///
    /// 返回 `false` 表示参与者已经不在或在此期间发送了心跳，事务不做任何修改。
    async fn evict_with_notice(
        &self,
        name: &ParticipantName,
        cutoff: Timestamp,
        notice: Message,
    ) -> Result<bool, RepositoryError>;
}
