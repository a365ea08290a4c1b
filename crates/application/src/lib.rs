//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：参与者加入与心跳、消息收发，
//! 以及后台在线清理任务。存储通过仓储 trait 抽象，由基础设施层或内存实现注入。

pub mod clock;
pub mod dto;
pub mod error;
pub mod memory;
pub mod presence;
pub mod repository;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use dto::{MessageDto, ParticipantDto};
pub use error::ApplicationError;
pub use memory::MemoryStore;
pub use presence::{
    PresenceSweeper, PresenceSweeperDependencies, SweepReport, STALENESS_THRESHOLD, SWEEP_INTERVAL,
};
pub use repository::{MessageRepository, ParticipantRepository, TransactionManager};
pub use services::{
    EditMessageRequest, JoinRequest, MessageService, MessageServiceDependencies,
    ParticipantService, ParticipantServiceDependencies, PostMessageRequest,
};
