//! 版本化数据库迁移
//!
//! 每个迁移以 `app.name` 标识，按声明顺序在独立事务中执行，
//! 已执行的迁移记录在 `care_migrations` 表中。

use crate::connection::DatabasePool;
use async_trait::async_trait;
use care_core::utils::generate_random_asset_id;
use care_core::{CareError, Result};
use sqlx::{PgConnection, Row};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// 单个迁移
#[async_trait]
pub trait Migration: Send + Sync {
    fn app(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// 依赖的迁移，格式为 `app.name`
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    async fn apply(&self, conn: &mut PgConnection) -> Result<()>;

    fn key(&self) -> String {
        format!("{}.{}", self.app(), self.name())
    }
}

/// 迁移执行器
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl Migrator {
    pub fn new(migrations: Vec<Box<dyn Migration>>) -> Self {
        Self { migrations }
    }

    /// 计算待执行的迁移，校验依赖关系
    pub fn plan(&self, applied: &HashSet<String>) -> Result<Vec<&dyn Migration>> {
        let mut satisfied = applied.clone();
        let mut pending = Vec::new();

        for migration in &self.migrations {
            let key = migration.key();
            if applied.contains(&key) {
                continue;
            }
            if let Some(missing) = migration
                .dependencies()
                .iter()
                .find(|dep| !satisfied.contains(**dep))
            {
                return Err(CareError::Migration(format!(
                    "{} depends on {} which has not been applied",
                    key, missing
                )));
            }
            satisfied.insert(key);
            pending.push(migration.as_ref());
        }

        Ok(pending)
    }

    /// 执行全部待执行迁移，返回本次执行的迁移标识
    pub async fn run(&self, pool: &DatabasePool) -> Result<Vec<String>> {
        let pool = pool.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS care_migrations (
                id SERIAL PRIMARY KEY,
                app VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                applied_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                UNIQUE (app, name)
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(CareError::from)?;

        let applied: HashSet<String> = sqlx::query("SELECT app, name FROM care_migrations")
            .fetch_all(pool)
            .await
            .map_err(CareError::from)?
            .into_iter()
            .map(|row| format!("{}.{}", row.get::<String, _>("app"), row.get::<String, _>("name")))
            .collect();

        let mut executed = Vec::new();
        for migration in self.plan(&applied)? {
            let key = migration.key();
            debug!("Applying migration {}", key);

            let mut tx = pool.begin().await.map_err(CareError::from)?;
            migration.apply(&mut *tx).await?;
            sqlx::query("INSERT INTO care_migrations (app, name) VALUES ($1, $2)")
                .bind(migration.app())
                .bind(migration.name())
                .execute(&mut *tx)
                .await
                .map_err(CareError::from)?;
            tx.commit().await.map_err(CareError::from)?;

            info!("Applied migration {}", key);
            executed.push(key);
        }

        Ok(executed)
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(vec![Box::new(InitialSchema), Box::new(AssetQrCodeId)])
    }
}

async fn execute_all(conn: &mut PgConnection, statements: &[&str]) -> Result<()> {
    for statement in statements {
        sqlx::query(*statement)
            .execute(&mut *conn)
            .await
            .map_err(CareError::from)?;
    }
    Ok(())
}

/// 初始表结构
pub struct InitialSchema;

#[async_trait]
impl Migration for InitialSchema {
    fn app(&self) -> &'static str {
        "core"
    }

    fn name(&self) -> &'static str {
        "0001_initial"
    }

    async fn apply(&self, conn: &mut PgConnection) -> Result<()> {
        execute_all(
            conn,
            &[
                r#"
                CREATE TABLE facilities (
                    id UUID PRIMARY KEY,
                    name VARCHAR(1000) NOT NULL,
                    district_id INTEGER NOT NULL,
                    state_id INTEGER NOT NULL
                )
                "#,
                r#"
                CREATE TABLE users (
                    id UUID PRIMARY KEY,
                    username VARCHAR(150) UNIQUE NOT NULL,
                    token_hash CHAR(64) UNIQUE,
                    user_type SMALLINT NOT NULL DEFAULT 10,
                    district_id INTEGER,
                    state_id INTEGER,
                    is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE
                )
                "#,
                r#"
                CREATE TABLE facility_users (
                    facility_id UUID NOT NULL REFERENCES facilities(id),
                    user_id UUID NOT NULL REFERENCES users(id),
                    PRIMARY KEY (facility_id, user_id)
                )
                "#,
                r#"
                CREATE TABLE abha_numbers (
                    id UUID PRIMARY KEY,
                    external_id UUID UNIQUE NOT NULL,
                    abha_number TEXT UNIQUE NOT NULL,
                    health_id TEXT,
                    email TEXT,
                    first_name TEXT,
                    middle_name TEXT,
                    last_name TEXT,
                    profile_photo TEXT,
                    txn_id TEXT,
                    access_token TEXT,
                    refresh_token TEXT,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                r#"
                CREATE TABLE patients (
                    id UUID PRIMARY KEY,
                    external_id UUID UNIQUE NOT NULL,
                    name VARCHAR(200) NOT NULL,
                    facility_id UUID REFERENCES facilities(id),
                    created_by UUID REFERENCES users(id),
                    abha_number_id UUID UNIQUE REFERENCES abha_numbers(id) ON DELETE SET NULL,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                r#"
                CREATE TABLE assets (
                    id UUID PRIMARY KEY,
                    external_id UUID UNIQUE NOT NULL,
                    name VARCHAR(1024) NOT NULL,
                    facility_id UUID NOT NULL REFERENCES facilities(id),
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                "CREATE INDEX idx_patients_facility_id ON patients(facility_id)",
                "CREATE INDEX idx_facilities_district_id ON facilities(district_id)",
                "CREATE INDEX idx_facilities_state_id ON facilities(state_id)",
            ],
        )
        .await
    }
}

/// 为资产添加唯一的二维码ID
///
/// 已有资产逐行回填各自的随机ID，之后才加非空和唯一约束。
pub struct AssetQrCodeId;

#[async_trait]
impl Migration for AssetQrCodeId {
    fn app(&self) -> &'static str {
        "facility"
    }

    fn name(&self) -> &'static str {
        "0287_asset_qr_code_id"
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["core.0001_initial"]
    }

    async fn apply(&self, conn: &mut PgConnection) -> Result<()> {
        sqlx::query("ALTER TABLE assets ADD COLUMN qr_code_id VARCHAR(1024)")
            .execute(&mut *conn)
            .await
            .map_err(CareError::from)?;

        let ids: Vec<Uuid> = sqlx::query("SELECT id FROM assets WHERE qr_code_id IS NULL")
            .fetch_all(&mut *conn)
            .await
            .map_err(CareError::from)?
            .into_iter()
            .map(|row| row.get("id"))
            .collect();

        for id in &ids {
            sqlx::query("UPDATE assets SET qr_code_id = $1 WHERE id = $2")
                .bind(generate_random_asset_id())
                .bind(id)
                .execute(&mut *conn)
                .await
                .map_err(CareError::from)?;
        }
        debug!("Backfilled qr_code_id for {} assets", ids.len());

        execute_all(
            conn,
            &[
                "ALTER TABLE assets ALTER COLUMN qr_code_id SET NOT NULL",
                "ALTER TABLE assets ADD CONSTRAINT assets_qr_code_id_key UNIQUE (qr_code_id)",
            ],
        )
        .await
    }
}
