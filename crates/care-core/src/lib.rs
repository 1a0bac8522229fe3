//! # CARE Core
//!
//! 健康ID服务的核心模块，提供基础数据结构、错误定义、患者可见范围和存储接口。

pub mod error;
pub mod models;
pub mod repository;
pub mod scope;
pub mod utils;

pub use error::{CareError, Result, ValidationErrors};
pub use models::*;
pub use repository::{
    AbhaNumberRepository, AssetRepository, CareStore, PatientRepository, UserRepository,
};
pub use scope::PatientScope;
