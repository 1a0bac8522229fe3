//! HTTP处理器

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use care_core::{CareError, ValidationErrors};
use serde_json::{json, Map, Value};
use tracing::{error, warn};

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "CARE ABDM HealthID API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "healthid": "/api/v1/abdm/healthid/",
            "openapi": "/api-docs/openapi.json"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 解析JSON请求体，空请求体视为空对象
pub fn parse_body(body: &Bytes) -> care_core::Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| {
        CareError::Validation(ValidationErrors::single(
            "non_field_errors",
            format!("JSON parse error - {}", e),
        ))
    })
}

/// HTTP层错误包装
#[derive(Debug)]
pub struct ApiError(pub CareError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<CareError> for ApiError {
    fn from(err: CareError) -> Self {
        ApiError(err)
    }
}

/// 错误处理
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            CareError::Validation(errors) => {
                warn!("Rejected request: {}", errors);
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            CareError::Gateway { status, body } => {
                warn!("ABDM gateway responded with {}", status);
                let body = Json(json!({
                    "error": "ABDM gateway error",
                    "status": status,
                    "detail": body
                }));
                return (StatusCode::BAD_GATEWAY, body).into_response();
            }
            CareError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            CareError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            CareError::Http(msg) => {
                error!("ABDM gateway unreachable: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
