use application::TransactionManager;
use async_trait::async_trait;
use domain::{Message, Participant, ParticipantName, RepositoryError, Timestamp};
use sqlx::PgPool;

use crate::repository::{insert_message, map_sqlx_err, ParticipantRecord};

/// 基于 PostgreSQL 事务的实现：参与者变化和通知一起提交或一起回滚
#[derive(Clone)]
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn join_with_notice(
        &self,
        participant: Participant,
        notice: Message,
    ) -> Result<Participant, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // 主键冲突会被映射成 Conflict
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"
            INSERT INTO participants (name, last_status)
            VALUES ($1, $2)
            RETURNING name, last_status
            "#,
        )
        .bind(participant.name.as_str())
        .bind(participant.last_status)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        insert_message(&mut *tx, &notice).await?;

        tx.commit().await.map_err(map_sqlx_err)?;

        tracing::debug!(participant = %participant.name, "participant inserted with join notice");
        Participant::try_from(record)
    }

    async fn evict_with_notice(
        &self,
        name: &ParticipantName,
        cutoff: Timestamp,
        notice: Message,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // 扫描之后又有心跳的参与者不会被删除
        let deleted = sqlx::query("DELETE FROM participants WHERE name = $1 AND last_status < $2")
            .bind(name.as_str())
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await.map_err(map_sqlx_err)?;
            return Ok(false);
        }

        insert_message(&mut *tx, &notice).await?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(true)
    }
}
