use application::{MessageRepository, ParticipantRepository};
use async_trait::async_trait;
use domain::{
    Message, MessageId, MessageKind, MessageLimit, MessageText, Participant, ParticipantName,
    Recipient, RepositoryError, Timestamp,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        other => RepositoryError::storage_with_source(other.to_string(), other),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
pub(crate) struct ParticipantRecord {
    name: String,
    last_status: OffsetDateTime,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = RepositoryError;

    fn try_from(value: ParticipantRecord) -> Result<Self, Self::Error> {
        let name = ParticipantName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Participant {
            name,
            last_status: value.last_status,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct MessageRecord {
    id: Uuid,
    sender: String,
    recipient: String,
    text: String,
    kind: String,
    created_at: OffsetDateTime,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let invalid = |err: domain::DomainError| invalid_data(err.to_string());
        Ok(Message {
            id: MessageId::from(value.id),
            from: ParticipantName::parse(value.sender).map_err(invalid)?,
            to: Recipient::parse(value.recipient).map_err(invalid)?,
            text: MessageText::parse(value.text).map_err(invalid)?,
            kind: value.kind.parse::<MessageKind>().map_err(invalid)?,
            created_at: value.created_at,
        })
    }
}

const MESSAGE_COLUMNS: &str = "id, sender, recipient, text, kind, created_at";

/// 插入一条消息，仓储和事务共用
pub(crate) async fn insert_message<'e, E>(
    executor: E,
    message: &Message,
) -> Result<Message, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let record = sqlx::query_as::<_, MessageRecord>(&format!(
        r#"
        INSERT INTO messages (id, sender, recipient, text, kind, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(Uuid::from(message.id))
    .bind(message.from.as_str())
    .bind(message.to.as_str())
    .bind(message.text.as_str())
    .bind(message.kind.as_str())
    .bind(message.created_at)
    .fetch_one(executor)
    .await
    .map_err(map_sqlx_err)?;

    Message::try_from(record)
}

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn exists(&self, name: &ParticipantName) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM participants WHERE name = $1)")
            .bind(name.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn find(&self, name: &ParticipantName) -> Result<Option<Participant>, RepositoryError> {
        let record = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_status FROM participants WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Participant::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Participant>, RepositoryError> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_status FROM participants ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }

    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE participants SET last_status = $2 WHERE name = $1")
            .bind(name.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_stale(&self, cutoff: Timestamp) -> Result<Vec<Participant>, RepositoryError> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_status FROM participants WHERE last_status < $1",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        insert_message(&self.pool, &message).await
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn list_visible(
        &self,
        viewer: &ParticipantName,
        limit: Option<MessageLimit>,
    ) -> Result<Vec<Message>, RepositoryError> {
        // LIMIT NULL 表示不限制条数
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE kind IN ('status', 'message')
               OR (kind = 'private_message' AND (sender = $1 OR recipient = $1))
            ORDER BY seq DESC
            LIMIT $2
            "#
        ))
        .bind(viewer.as_str())
        .bind(limit.map(|limit| i64::from(limit.get())))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn update(&self, message: Message) -> Result<Message, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            UPDATE messages
            SET recipient = $2, text = $3, kind = $4
            WHERE id = $1
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::from(message.id))
        .bind(message.to.as_str())
        .bind(message.text.as_str())
        .bind(message.kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        Message::try_from(record)
    }

    async fn delete(&self, id: MessageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// 创建 PostgreSQL 连接池
pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
