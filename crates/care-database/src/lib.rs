//! # CARE数据库模块
//!
//! 负责患者、ABHA号码和资产数据的存储，提供PostgreSQL连接池、查询操作和版本化迁移。

pub mod connection;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

// 重新导出主要类型
pub use connection::{DatabasePool, PoolOptions};
pub use migrations::{Migration, Migrator};
pub use models::*;
pub use queries::DatabaseQueries;
pub use store::PgStore;
