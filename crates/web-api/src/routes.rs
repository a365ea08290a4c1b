use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use validator::Validate;

use application::{
    ApplicationError, EditMessageRequest, JoinRequest, MessageDto, ParticipantDto,
    PostMessageRequest,
};
use domain::{DomainError, MessageId, MessageLimit};

use crate::{
    error::ApiError,
    extract::{RequestUser, ValidatedJson},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
struct JoinPayload {
    #[validate(length(min = 1))]
    name: String,
}

#[derive(Debug, Deserialize, Validate)]
struct MessagePayload {
    #[validate(length(min = 1))]
    to: String,
    #[validate(length(min = 1))]
    text: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ListMessagesQuery {
    // 保留原始字符串，非法值由领域层给出 422
    limit: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/participants", post(join).get(list_participants))
        .route("/status", post(heartbeat))
        .route("/messages", post(post_message).get(list_messages))
        .route("/messages/{id}", put(edit_message).delete(delete_message))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

// 不是 UUID 的 id 不可能对应任何消息
fn parse_message_id(raw: &str) -> Result<MessageId, ApiError> {
    Uuid::parse_str(raw)
        .map(MessageId::from)
        .map_err(|_| ApplicationError::from(DomainError::MessageNotFound).into())
}

async fn join(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<JoinPayload>,
) -> Result<(StatusCode, Json<ParticipantDto>), ApiError> {
    let participant = state
        .participant_service
        .join(JoinRequest { name: payload.name })
        .await?;

    Ok((StatusCode::CREATED, Json(ParticipantDto::from(&participant))))
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let participants = state.participant_service.list().await?;
    Ok(Json(participants.iter().map(ParticipantDto::from).collect()))
}

async fn heartbeat(
    State(state): State<AppState>,
    user: RequestUser,
) -> Result<StatusCode, ApiError> {
    state.participant_service.heartbeat(user.name()).await?;
    Ok(StatusCode::OK)
}

async fn post_message(
    State(state): State<AppState>,
    user: RequestUser,
    ValidatedJson(payload): ValidatedJson<MessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let message = state
        .message_service
        .post_message(PostMessageRequest {
            from: user.name().to_owned(),
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

async fn list_messages(
    State(state): State<AppState>,
    user: RequestUser,
    query: Result<Query<ListMessagesQuery>, QueryRejection>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    // 重复的 limit 等无法解析的查询串同样返回 422
    let Query(query) =
        query.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    let limit = query
        .limit
        .as_deref()
        .map(MessageLimit::parse)
        .transpose()
        .map_err(ApplicationError::from)?;

    let messages = state
        .message_service
        .list_visible_messages(user.name(), limit)
        .await?;

    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

async fn edit_message(
    State(state): State<AppState>,
    user: RequestUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<MessagePayload>,
) -> Result<Json<MessageDto>, ApiError> {
    let id = parse_message_id(&id)?;
    let message = state
        .message_service
        .edit_message(EditMessageRequest {
            id,
            author: user.name().to_owned(),
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;

    Ok(Json(MessageDto::from(&message)))
}

async fn delete_message(
    State(state): State<AppState>,
    user: RequestUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_message_id(&id)?;
    state.message_service.delete_message(id, user.name()).await?;
    Ok(StatusCode::OK)
}
