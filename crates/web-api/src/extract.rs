//! 请求提取器
//!
//! `RequestUser` 读取未经验证的 `user` 请求头；`ValidatedJson` 解析并校验请求体，
//! 任何格式或字段错误都返回 422。

use std::convert::Infallible;

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

pub const USER_HEADER: &str = "user";

/// 请求方声明的参与者名字。
///
/// 缺少请求头或内容不是 UTF-8 时为空，后续按“不在房间里”处理。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestUser(pub Option<String>);

impl RequestUser {
    pub fn name(&self) -> &str {
        self.0.as_deref().unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for RequestUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .map(str::to_owned);
        Ok(Self(name))
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
        payload
            .validate()
            .map_err(|errors| ApiError::unprocessable(errors.to_string()))?;
        Ok(Self(payload))
    }
}
