//! # CARE ABDM集成模块
//!
//! 与国家健康ID注册中心（ABDM）的集成：
//! - Aadhaar / 手机 OTP 的生成、重发和校验
//! - 健康ID（ABHA号码）创建并关联到患者
//! - 请求体校验

pub mod gateway;
pub mod payloads;
pub mod service;

pub use gateway::{GatewayConfig, HealthIdAction, HealthIdApi, HealthIdGateway};
pub use payloads::{
    AadhaarOtpGenerateRequest, AadhaarOtpResendRequest, CreateHealthIdRequest,
    GenerateMobileOtpRequest, RequestPayload, VerifyOtpRequest,
};
pub use service::HealthIdService;
