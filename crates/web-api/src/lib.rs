//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的参与者服务和消息服务。

mod error;
mod extract;
mod routes;
mod state;

pub use error::{ApiError, ErrorBody};
pub use extract::{RequestUser, ValidatedJson, USER_HEADER};
pub use routes::router;
pub use state::AppState;
