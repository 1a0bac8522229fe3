//! # CARE管理模块
//!
//! 提供配置加载与校验

pub mod config;

pub use config::{AbdmConfig, CareConfig, ConfigManager, ConfigValidator, DatabaseConfig};
