//! Web服务器

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use care_abdm::HealthIdService;
use care_core::Result;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::auth_middleware;
use crate::docs::openapi_json;
use crate::handlers::{api_root, health};
use crate::healthid;

/// 请求共享状态
#[derive(Clone)]
pub struct AppState {
    pub health_id: HealthIdService,
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            app: create_app(state),
        }
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}

/// 创建应用路由
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // 根路径
        .route("/", get(api_root))

        // 健康检查
        .route("/health", get(health))

        // OpenAPI文档
        .route("/api-docs/openapi.json", get(openapi_json))

        // ABDM健康ID路由（需要认证）
        .nest("/api/v1/abdm/healthid", healthid_routes(state))

        // 全局中间件
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// ABDM健康ID路由
fn healthid_routes(state: AppState) -> Router {
    Router::new()
        .route("/generate_aadhaar_otp/", post(healthid::generate_aadhaar_otp))
        .route("/resend_aadhaar_otp/", post(healthid::resend_aadhaar_otp))
        .route("/verify_aadhaar_otp/", post(healthid::verify_aadhaar_otp))
        .route("/generate_mobile_otp/", post(healthid::generate_mobile_otp))
        .route("/verify_mobile_otp/", post(healthid::verify_mobile_otp))
        .route("/create_health_id/", post(healthid::create_health_id))
        .route(
            "/check_and_generate_mobile_otp/",
            post(healthid::check_and_generate_mobile_otp),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use care_abdm::{HealthIdAction, HealthIdApi};
    use care_core::repository::memory::MemoryStore;
    use care_core::{CareError, Patient, User, UserType};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;
    use uuid::Uuid;

    const TOKEN: &str = "staff-token";

    struct ScriptedGateway {
        calls: Mutex<Vec<HealthIdAction>>,
    }

    #[async_trait]
    impl HealthIdApi for ScriptedGateway {
        async fn post(&self, action: HealthIdAction, _data: &Value) -> care_core::Result<Value> {
            self.calls.lock().unwrap().push(action);
            match action {
                HealthIdAction::VerifyAadhaarOtp => Err(CareError::Gateway {
                    status: 422,
                    body: json!({"code": "HIS-422", "message": "Invalid OTP"}),
                }),
                HealthIdAction::CreateHealthId => Ok(json!({
                    "healthIdNumber": "91-1111-2222-3333",
                    "healthId": "kiran@sbx",
                    "firstName": "Kiran",
                    "token": "jwt"
                })),
                _ => Ok(json!({"txnId": "txn-42"})),
            }
        }
    }

    struct Fixture {
        app: Router,
        store: Arc<MemoryStore>,
        gateway: Arc<ScriptedGateway>,
        patient: Patient,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let user = User {
            id: Uuid::new_v4(),
            username: "staff".to_string(),
            user_type: UserType::STAFF,
            district_id: None,
            state_id: None,
            is_superuser: false,
            is_active: true,
        };
        let patient = Patient {
            id: Uuid::new_v4(),
            external_id: Uuid::new_v4(),
            name: "Kiran".to_string(),
            facility_id: None,
            created_by: Some(user.id),
            abha_number_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        store.add_user(user.clone(), TOKEN).await;
        store
            .add_user(
                User {
                    id: Uuid::new_v4(),
                    username: "retired".to_string(),
                    is_active: false,
                    ..user
                },
                "inactive-token",
            )
            .await;
        store.add_patient(patient.clone()).await;

        let gateway = Arc::new(ScriptedGateway {
            calls: Mutex::new(Vec::new()),
        });
        let service = HealthIdService::new(gateway.clone(), store.clone());
        let app = create_app(AppState { health_id: service });

        Fixture {
            app,
            store,
            gateway,
            patient,
        }
    }

    fn post_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let f = fixture().await;
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn healthid_requires_token() {
        let f = fixture().await;
        let req = post_json(
            "/api/v1/abdm/healthid/generate_aadhaar_otp/",
            None,
            json!({"aadhaar": "123412341234"}),
        );
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(f.gateway.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_user_is_rejected() {
        let f = fixture().await;
        let req = post_json(
            "/api/v1/abdm/healthid/resend_aadhaar_otp/",
            Some("inactive-token"),
            json!({"txnId": "txn-1"}),
        );
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn generate_aadhaar_otp_returns_gateway_response() {
        let f = fixture().await;
        let req = post_json(
            "/api/v1/abdm/healthid/generate_aadhaar_otp/",
            Some(TOKEN),
            json!({"aadhaar": "123412341234"}),
        );
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"txnId": "txn-42"}));
        assert_eq!(
            *f.gateway.calls.lock().unwrap(),
            vec![HealthIdAction::GenerateAadhaarOtp]
        );
    }

    #[tokio::test]
    async fn every_action_accepts_authenticated_user() {
        let f = fixture().await;
        let requests = [
            ("generate_aadhaar_otp", json!({"aadhaar": "123412341234"})),
            ("resend_aadhaar_otp", json!({"txnId": "txn-1"})),
            ("generate_mobile_otp", json!({"mobile": "9876543210", "txnId": "txn-1"})),
            ("verify_mobile_otp", json!({"otp": "654321", "txnId": "txn-1"})),
            (
                "check_and_generate_mobile_otp",
                json!({"mobile": "9876543210", "txnId": "txn-1"}),
            ),
        ];

        for (action, body) in requests {
            let path = format!("/api/v1/abdm/healthid/{}/", action);
            let response = f
                .app
                .clone()
                .oneshot(post_json(&path, Some(TOKEN), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", action);
        }
        assert_eq!(f.gateway.calls.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn invalid_payload_returns_field_errors() {
        let f = fixture().await;
        let req = post_json(
            "/api/v1/abdm/healthid/generate_mobile_otp/",
            Some(TOKEN),
            json!({"mobile": "123"}),
        );
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({
                "mobile": ["Ensure this field has at least 10 characters."],
                "txnId": ["This field is required."]
            })
        );
    }

    #[tokio::test]
    async fn gateway_error_maps_to_bad_gateway() {
        let f = fixture().await;
        let req = post_json(
            "/api/v1/abdm/healthid/verify_aadhaar_otp/",
            Some(TOKEN),
            json!({"otp": "123456", "txnId": "txn-1"}),
        );
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["status"], 422);
        assert_eq!(body["detail"]["code"], "HIS-422");
    }

    #[tokio::test]
    async fn create_health_id_links_patient() {
        let f = fixture().await;
        let req = post_json(
            "/api/v1/abdm/healthid/create_health_id/",
            Some(TOKEN),
            json!({"txnId": "txn-1", "patientId": f.patient.external_id.to_string()}),
        );
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["healthIdNumber"], "91-1111-2222-3333");

        let patient = f.store.patient(f.patient.id).await.unwrap();
        assert!(patient.abha_number_id.is_some());
    }

    #[tokio::test]
    async fn create_health_id_unknown_patient() {
        let f = fixture().await;
        let req = post_json(
            "/api/v1/abdm/healthid/create_health_id/",
            Some(TOKEN),
            json!({"txnId": "txn-1", "patientId": Uuid::new_v4().to_string()}),
        );
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"patient": ["Not Found"]}));
        assert!(f.gateway.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let f = fixture().await;
        let req = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let response = f.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await["paths"]
            .get("/api/v1/abdm/healthid/generate_aadhaar_otp/")
            .is_some());
    }
}
