//! services/api/src/web/extract.rs

use crate::error::ApiError;
use axum::extract::FromRequest;

/// `axum::Json` whose rejections are reported as `ApiError`, so malformed or
/// incomplete bodies get the same JSON `{message}` shape as every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
