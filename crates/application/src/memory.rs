//! 内存实现的存储（用于测试和无数据库的本地运行）
//!
//! 两个集合放在同一把读写锁后面，事务性的操作在一次写锁内完成，
//! 因此与 PostgreSQL 实现一样满足“全部成功或全部不生效”。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use domain::{
    Message, MessageId, MessageLimit, Participant, ParticipantName, RepositoryError, Timestamp,
};
use tokio::sync::RwLock;

use crate::repository::{MessageRepository, ParticipantRepository, TransactionManager};

#[derive(Default)]
struct Collections {
    participants: BTreeMap<ParticipantName, Participant>,
    // 按插入顺序保存
    messages: Vec<Message>,
}

impl Collections {
    fn append_message(
        &mut self,
        message: Message,
        fail_writes: &AtomicBool,
    ) -> Result<Message, RepositoryError> {
        if fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::storage("message write rejected"));
        }
        self.messages.push(message.clone());
        Ok(message)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    fail_message_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让之后的消息写入全部失败，用来验证事务回滚
    pub fn fail_message_writes(&self, fail: bool) {
        self.fail_message_writes.store(fail, Ordering::SeqCst);
    }

    /// 所有消息（包括私聊），按插入顺序
    pub async fn all_messages(&self) -> Vec<Message> {
        self.inner.read().await.messages.clone()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryStore {
    async fn exists(&self, name: &ParticipantName) -> Result<bool, RepositoryError> {
        Ok(self.inner.read().await.participants.contains_key(name))
    }

    async fn find(&self, name: &ParticipantName) -> Result<Option<Participant>, RepositoryError> {
        Ok(self.inner.read().await.participants.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .participants
            .values()
            .cloned()
            .collect())
    }

    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        match inner.participants.get_mut(name) {
            Some(participant) => {
                participant.heartbeat(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_stale(&self, cutoff: Timestamp) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .participants
            .values()
            .filter(|participant| participant.is_stale(cutoff))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut inner = self.inner.write().await;
        inner.append_message(message, &self.fail_message_writes)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .messages
            .iter()
            .find(|message| message.id == id)
            .cloned())
    }

    async fn list_visible(
        &self,
        viewer: &ParticipantName,
        limit: Option<MessageLimit>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let take = limit.map_or(usize::MAX, |limit| limit.get() as usize);
        Ok(self
            .inner
            .read()
            .await
            .messages
            .iter()
            .rev()
            .filter(|message| message.is_visible_to(viewer))
            .take(take)
            .cloned()
            .collect())
    }

    async fn update(&self, message: Message) -> Result<Message, RepositoryError> {
        if self.fail_message_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::storage("message write rejected"));
        }
        let mut inner = self.inner.write().await;
        let slot = inner
            .messages
            .iter_mut()
            .find(|stored| stored.id == message.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = message.clone();
        Ok(message)
    }

    async fn delete(&self, id: MessageId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.messages.len();
        inner.messages.retain(|message| message.id != id);
        if inner.messages.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for MemoryStore {
    async fn join_with_notice(
        &self,
        participant: Participant,
        notice: Message,
    ) -> Result<Participant, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.participants.contains_key(&participant.name) {
            return Err(RepositoryError::Conflict);
        }

        inner
            .participants
            .insert(participant.name.clone(), participant.clone());

        // 通知写入失败时撤销参与者
        if let Err(err) = inner.append_message(notice, &self.fail_message_writes) {
            inner.participants.remove(&participant.name);
            return Err(err);
        }

        Ok(participant)
    }

    async fn evict_with_notice(
        &self,
        name: &ParticipantName,
        cutoff: Timestamp,
        notice: Message,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let still_stale = inner
            .participants
            .get(name)
            .is_some_and(|participant| participant.is_stale(cutoff));
        if !still_stale {
            return Ok(false);
        }

        inner.append_message(notice, &self.fail_message_writes)?;
        inner.participants.remove(name);
        Ok(true)
    }
}
