//! OpenAPI文档

use axum::Json;
use care_abdm::{
    AadhaarOtpGenerateRequest, AadhaarOtpResendRequest, CreateHealthIdRequest,
    GenerateMobileOtpRequest, VerifyOtpRequest,
};
use utoipa::OpenApi;

use crate::healthid;

#[derive(OpenApi)]
#[openapi(
    paths(
        healthid::generate_aadhaar_otp,
        healthid::resend_aadhaar_otp,
        healthid::verify_aadhaar_otp,
        healthid::generate_mobile_otp,
        healthid::verify_mobile_otp,
        healthid::create_health_id,
        healthid::check_and_generate_mobile_otp
    ),
    components(schemas(
        AadhaarOtpGenerateRequest,
        AadhaarOtpResendRequest,
        VerifyOtpRequest,
        GenerateMobileOtpRequest,
        CreateHealthIdRequest
    )),
    tags(
        (name = "ABDM HealthID", description = "Aadhaar based health ID registration"),
        (name = "ABDM HealthID V2", description = "Health ID registration, V2 flows")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
