//! 领域模型错误定义
//!
//! 区分业务规则错误（`DomainError`）与存储层错误（`RepositoryError`），
//! Web 层据此映射到对应的 HTTP 状态码。

use std::error::Error as StdError;

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 字段校验失败
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 同名参与者已经在房间里
    #[error("participant already exists")]
    ParticipantAlreadyExists,

    /// 参与者不存在（心跳时）
    #[error("participant not found")]
    ParticipantNotFound,

    /// 发送者不是当前房间内的参与者
    #[error("sender is not a registered participant")]
    SenderNotRegistered,

    /// 查看消息的人不是当前房间内的参与者
    #[error("viewer is not a registered participant")]
    ViewerNotRegistered,

    #[error("message not found")]
    MessageNotFound,

    /// 只有消息作者可以编辑或删除消息
    #[error("only the author may change this message")]
    NotMessageAuthor,

    /// 进入/离开通知由系统生成，不能编辑或删除
    #[error("system notices cannot be changed")]
    NoticeImmutable,
}

impl DomainError {
    /// 创建校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 存储层错误
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// 唯一约束冲突
    #[error("record already exists")]
    Conflict,

    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
