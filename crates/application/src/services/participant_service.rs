use std::sync::Arc;

use domain::{DomainError, Message, MessageId, Participant, ParticipantName, RepositoryError};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{ParticipantRepository, TransactionManager},
};

#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub name: String,
}

pub struct ParticipantServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub transaction_manager: Arc<dyn TransactionManager>,
    pub clock: Arc<dyn Clock>,
}

pub struct ParticipantService {
    deps: ParticipantServiceDependencies,
}

impl ParticipantService {
    pub fn new(deps: ParticipantServiceDependencies) -> Self {
        Self { deps }
    }

    /// 加入房间：写入参与者以及一条进入通知。
    ///
    /// 先查一次同名参与者，给出友好的冲突错误；真正的唯一性由存储层保证，
    /// 并发加入时存储层返回的冲突同样映射为 `ParticipantAlreadyExists`。
    pub async fn join(&self, request: JoinRequest) -> Result<Participant, ApplicationError> {
        let name = ParticipantName::parse(request.name)?;

        if self.deps.participant_repository.exists(&name).await? {
            return Err(DomainError::ParticipantAlreadyExists.into());
        }

        let now = self.deps.clock.now();
        let participant = Participant::join(name.clone(), now);
        let notice = Message::joined(MessageId::generate(), &name, now);

        match self
            .deps
            .transaction_manager
            .join_with_notice(participant, notice)
            .await
        {
            Ok(joined) => {
                tracing::info!(participant = %joined.name, "participant joined");
                Ok(joined)
            }
            Err(RepositoryError::Conflict) => Err(DomainError::ParticipantAlreadyExists.into()),
            Err(err) => Err(err.into()),
        }
    }

    /// 刷新心跳时间，没有通知消息
    pub async fn heartbeat(&self, name: &str) -> Result<(), ApplicationError> {
        let name = ParticipantName::parse(name).map_err(|_| DomainError::ParticipantNotFound)?;
        let now = self.deps.clock.now();

        let touched = self.deps.participant_repository.touch(&name, now).await?;
        if !touched {
            return Err(DomainError::ParticipantNotFound.into());
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Participant>, ApplicationError> {
        Ok(self.deps.participant_repository.list().await?)
    }
}
