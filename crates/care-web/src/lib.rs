//! # CARE Web模块
//!
//! 健康ID的HTTP接口：路由、令牌认证、错误映射和OpenAPI文档。

pub mod auth;
pub mod docs;
pub mod handlers;
pub mod healthid;
pub mod server;

pub use handlers::{ApiError, ApiResult};
pub use server::{create_app, AppState, WebServer};
