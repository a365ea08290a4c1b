//! 基础设施层实现。
//!
//! 提供基于 PostgreSQL 的仓储和事务实现，满足应用层定义的接口。

pub mod migrations;
pub mod repository;
pub mod transaction;

pub use migrations::MIGRATOR;
pub use repository::{create_pg_pool, PgMessageRepository, PgParticipantRepository};
pub use transaction::PgTransactionManager;
