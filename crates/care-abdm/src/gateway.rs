//! ABDM健康ID网关客户端
//!
//! 每次调用先向网关申请会话令牌，再以Bearer方式调用健康ID服务。
//! 请求体按原样转发，响应JSON按原样返回。

use async_trait::async_trait;
use care_core::{CareError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// 网关配置
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 会话网关地址，例如 https://dev.abdm.gov.in/gateway
    pub gateway_url: String,
    /// 健康ID服务地址，例如 https://healthidsbx.abdm.gov.in/api
    pub health_service_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
}

/// 健康ID接口动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthIdAction {
    GenerateAadhaarOtp,
    ResendAadhaarOtp,
    VerifyAadhaarOtp,
    GenerateMobileOtp,
    VerifyMobileOtp,
    CreateHealthId,
    CheckAndGenerateMobileOtp,
}

impl HealthIdAction {
    /// 健康ID服务上的路径
    pub fn path(&self) -> &'static str {
        match self {
            Self::GenerateAadhaarOtp => "/v1/registration/aadhaar/generateOtp",
            Self::ResendAadhaarOtp => "/v1/registration/aadhaar/resendAadhaarOtp",
            Self::VerifyAadhaarOtp => "/v1/registration/aadhaar/verifyOTP",
            Self::GenerateMobileOtp => "/v1/registration/aadhaar/generateMobileOTP",
            Self::VerifyMobileOtp => "/v1/registration/aadhaar/verifyMobileOTP",
            Self::CreateHealthId => "/v1/registration/aadhaar/createHealthIdWithPreVerified",
            Self::CheckAndGenerateMobileOtp => "/v2/registration/aadhaar/checkAndGenerateMobileOTP",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateAadhaarOtp => "generate_aadhaar_otp",
            Self::ResendAadhaarOtp => "resend_aadhaar_otp",
            Self::VerifyAadhaarOtp => "verify_aadhaar_otp",
            Self::GenerateMobileOtp => "generate_mobile_otp",
            Self::VerifyMobileOtp => "verify_mobile_otp",
            Self::CreateHealthId => "create_health_id",
            Self::CheckAndGenerateMobileOtp => "check_and_generate_mobile_otp",
        }
    }
}

/// 健康ID服务接口
#[async_trait]
pub trait HealthIdApi: Send + Sync {
    /// 调用指定动作，返回服务端JSON
    async fn post(&self, action: HealthIdAction, data: &Value) -> Result<Value>;

    async fn generate_aadhaar_otp(&self, data: &Value) -> Result<Value> {
        self.post(HealthIdAction::GenerateAadhaarOtp, data).await
    }

    async fn resend_aadhaar_otp(&self, data: &Value) -> Result<Value> {
        self.post(HealthIdAction::ResendAadhaarOtp, data).await
    }

    async fn verify_aadhaar_otp(&self, data: &Value) -> Result<Value> {
        self.post(HealthIdAction::VerifyAadhaarOtp, data).await
    }

    async fn generate_mobile_otp(&self, data: &Value) -> Result<Value> {
        self.post(HealthIdAction::GenerateMobileOtp, data).await
    }

    async fn verify_mobile_otp(&self, data: &Value) -> Result<Value> {
        self.post(HealthIdAction::VerifyMobileOtp, data).await
    }

    async fn create_health_id(&self, data: &Value) -> Result<Value> {
        self.post(HealthIdAction::CreateHealthId, data).await
    }

    async fn check_and_generate_mobile_otp(&self, data: &Value) -> Result<Value> {
        self.post(HealthIdAction::CheckAndGenerateMobileOtp, data).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    access_token: String,
}

/// 基于reqwest的ABDM网关客户端
pub struct HealthIdGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HealthIdGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CareError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// 申请会话令牌
    async fn session_token(&self) -> Result<String> {
        let url = join_url(&self.config.gateway_url, "/v0.5/sessions");
        debug!("Requesting ABDM session token");

        let response = self
            .client
            .post(&url)
            .json(&SessionRequest {
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
            })
            .send()
            .await
            .map_err(|e| CareError::Http(e.to_string()))?;

        let (status, body) = read_body(response).await?;
        if !status.is_success() {
            warn!("ABDM session request failed with status {}", status);
            return Err(CareError::Gateway { status: status.as_u16(), body });
        }

        let session: SessionResponse = serde_json::from_value(body)?;
        Ok(session.access_token)
    }
}

#[async_trait]
impl HealthIdApi for HealthIdGateway {
    async fn post(&self, action: HealthIdAction, data: &Value) -> Result<Value> {
        let token = self.session_token().await?;
        let url = join_url(&self.config.health_service_url, action.path());
        debug!("Calling ABDM {}", action.as_str());

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Accept-Language", "en-US")
            .json(data)
            .send()
            .await
            .map_err(|e| CareError::Http(e.to_string()))?;

        let (status, body) = read_body(response).await?;
        if !status.is_success() {
            warn!("ABDM {} returned status {}", action.as_str(), status);
            return Err(CareError::Gateway { status: status.as_u16(), body });
        }
        Ok(body)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// 读取响应体；非JSON内容以字符串形式保留
async fn read_body(response: reqwest::Response) -> Result<(reqwest::StatusCode, Value)> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| CareError::Http(e.to_string()))?;

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct RecordedCall {
        path: String,
        authorization: Option<String>,
        accept_language: Option<String>,
        body: Value,
    }

    #[derive(Clone, Default)]
    struct Recorded {
        calls: Arc<Mutex<Vec<RecordedCall>>>,
    }

    async fn sessions(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["clientId"] == "care" && body["clientSecret"] == "secret" {
            (StatusCode::OK, Json(json!({"accessToken": "session-token", "expiresIn": 600})))
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid client"})))
        }
    }

    fn record(recorded: &Recorded, path: &str, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        recorded.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            authorization: header("authorization"),
            accept_language: header("accept-language"),
            body,
        });
    }

    async fn generate_otp(
        State(recorded): State<Recorded>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        record(&recorded, "generateOtp", &headers, body);
        Json(json!({"txnId": "txn-123"}))
    }

    async fn verify_otp(
        State(recorded): State<Recorded>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        record(&recorded, "verifyOTP", &headers, body);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"code": "HIS-422", "message": "Invalid OTP"})),
        )
    }

    async fn spawn_registry() -> (String, Recorded) {
        let recorded = Recorded::default();
        let app = Router::new()
            .route("/gateway/v0.5/sessions", post(sessions))
            .route("/api/v1/registration/aadhaar/generateOtp", post(generate_otp))
            .route("/api/v1/registration/aadhaar/verifyOTP", post(verify_otp))
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), recorded)
    }

    fn gateway(base: &str, secret: &str) -> HealthIdGateway {
        HealthIdGateway::new(GatewayConfig {
            gateway_url: format!("{}/gateway/", base),
            health_service_url: format!("{}/api", base),
            client_id: "care".to_string(),
            client_secret: secret.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_forwards_body_with_session_token() {
        let (base, recorded) = spawn_registry().await;
        let gateway = gateway(&base, "secret");

        let response = gateway
            .generate_aadhaar_otp(&json!({"aadhaar": "123412341234"}))
            .await
            .unwrap();
        assert_eq!(response, json!({"txnId": "txn-123"}));

        let calls = recorded.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "generateOtp");
        assert_eq!(calls[0].authorization.as_deref(), Some("Bearer session-token"));
        assert_eq!(calls[0].accept_language.as_deref(), Some("en-US"));
        assert_eq!(calls[0].body, json!({"aadhaar": "123412341234"}));
    }

    #[tokio::test]
    async fn test_error_status_becomes_gateway_error() {
        let (base, _) = spawn_registry().await;
        let gateway = gateway(&base, "secret");

        let err = gateway
            .verify_aadhaar_otp(&json!({"otp": "000000", "txnId": "txn-123"}))
            .await
            .unwrap_err();
        match err {
            CareError::Gateway { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body["code"], "HIS-422");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_session_stops_call() {
        let (base, recorded) = spawn_registry().await;
        let gateway = gateway(&base, "wrong");

        let err = gateway
            .generate_aadhaar_otp(&json!({"aadhaar": "123412341234"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CareError::Gateway { status: 401, .. }));
        assert!(recorded.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_action_paths() {
        assert_eq!(
            HealthIdAction::CheckAndGenerateMobileOtp.path(),
            "/v2/registration/aadhaar/checkAndGenerateMobileOTP"
        );
        assert_eq!(join_url("https://example.org/api/", "/v1/x"), "https://example.org/api/v1/x");
    }
}
