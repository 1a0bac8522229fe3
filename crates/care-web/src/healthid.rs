//! ABDM健康ID接口
//!
//! 所有动作都接收JSON请求体，校验后转发给ABDM，成功时原样返回ABDM响应。

use axum::{body::Bytes, extract::State, Extension, Json};
use care_abdm::{
    AadhaarOtpGenerateRequest, AadhaarOtpResendRequest, CreateHealthIdRequest,
    GenerateMobileOtpRequest, VerifyOtpRequest,
};
use care_core::User;
use serde_json::Value;
use tracing::info;

use crate::handlers::{parse_body, ApiResult};
use crate::server::AppState;

/// 生成Aadhaar OTP
#[utoipa::path(
    post,
    path = "/api/v1/abdm/healthid/generate_aadhaar_otp/",
    operation_id = "generate_aadhaar_otp",
    request_body = AadhaarOtpGenerateRequest,
    responses((status = 200, description = "{'txnId': 'string'}")),
    tag = "ABDM HealthID"
)]
pub async fn generate_aadhaar_otp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    info!("generate_aadhaar_otp requested by {}", user.username);
    let response = state.health_id.generate_aadhaar_otp(parse_body(&body)?).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/abdm/healthid/resend_aadhaar_otp/",
    operation_id = "resend_aadhaar_otp",
    request_body = AadhaarOtpResendRequest,
    responses((status = 200, description = "{'txnId': 'string'}")),
    tag = "ABDM HealthID"
)]
pub async fn resend_aadhaar_otp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    info!("resend_aadhaar_otp requested by {}", user.username);
    let response = state.health_id.resend_aadhaar_otp(parse_body(&body)?).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/abdm/healthid/verify_aadhaar_otp/",
    operation_id = "verify_aadhaar_otp",
    request_body = VerifyOtpRequest,
    responses((status = 200, description = "{'txnId': 'string'}")),
    tag = "ABDM HealthID"
)]
pub async fn verify_aadhaar_otp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    info!("verify_aadhaar_otp requested by {}", user.username);
    let response = state.health_id.verify_aadhaar_otp(parse_body(&body)?).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/abdm/healthid/generate_mobile_otp/",
    operation_id = "generate_mobile_otp",
    request_body = GenerateMobileOtpRequest,
    responses((status = 200, description = "{'txnId': 'string'}")),
    tag = "ABDM HealthID"
)]
pub async fn generate_mobile_otp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    info!("generate_mobile_otp requested by {}", user.username);
    let response = state.health_id.generate_mobile_otp(parse_body(&body)?).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/abdm/healthid/verify_mobile_otp/",
    operation_id = "verify_mobile_otp",
    request_body = VerifyOtpRequest,
    responses((status = 200, description = "{'txnId': 'string'}")),
    tag = "ABDM HealthID"
)]
pub async fn verify_mobile_otp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    info!("verify_mobile_otp requested by {}", user.username);
    let response = state.health_id.verify_mobile_otp(parse_body(&body)?).await?;
    Ok(Json(response))
}

/// 创建健康ID并关联到患者
#[utoipa::path(
    post,
    path = "/api/v1/abdm/healthid/create_health_id/",
    operation_id = "create_health_id",
    request_body = CreateHealthIdRequest,
    responses(
        (status = 200, description = "{'txnId': 'string'}"),
        (status = 400, description = "Invalid payload or patient not found")
    ),
    tag = "ABDM HealthID"
)]
pub async fn create_health_id(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    info!("create_health_id requested by {}", user.username);
    let response = state
        .health_id
        .create_health_id(&user, parse_body(&body)?)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/abdm/healthid/check_and_generate_mobile_otp/",
    operation_id = "check_and_generate_mobile_otp",
    request_body = GenerateMobileOtpRequest,
    responses((status = 200, description = "{'txnId': 'string'}")),
    tag = "ABDM HealthID V2"
)]
pub async fn check_and_generate_mobile_otp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    info!("check_and_generate_mobile_otp requested by {}", user.username);
    let response = state
        .health_id
        .check_and_generate_mobile_otp(parse_body(&body)?)
        .await?;
    Ok(Json(response))
}
