//! 数据库查询操作

use crate::connection::DatabasePool;
use crate::models::*;
use care_core::{
    AbhaNumber, Asset, CareError, NewAbhaNumber, NewAsset, Patient, PatientScope, Result, User,
};
use uuid::Uuid;

/// 数据库查询操作接口
pub struct DatabaseQueries<'a> {
    pool: &'a DatabasePool,
}

impl<'a> DatabaseQueries<'a> {
    pub fn new(pool: &'a DatabasePool) -> Self {
        Self { pool }
    }

    // ========== 用户相关操作 ==========

    /// 根据令牌摘要查找用户
    pub async fn get_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, user_type, district_id, state_id, is_superuser, is_active \
             FROM users WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
        .map_err(CareError::from)?;

        Ok(result.map(User::from))
    }

    // ========== 患者相关操作 ==========

    /// 在用户可见范围内按外部ID查找患者
    pub async fn get_visible_patient(&self, user: &User, external_id: &Uuid) -> Result<Option<Patient>> {
        let pool = self.pool.pool();

        let query = match PatientScope::for_user(user) {
            PatientScope::All => {
                sqlx::query_as::<_, DbPatient>("SELECT p.* FROM patients p WHERE p.external_id = $1")
                    .bind(external_id)
            }
            PatientScope::State(state_id) => sqlx::query_as::<_, DbPatient>(
                r#"
                SELECT p.* FROM patients p
                JOIN facilities f ON f.id = p.facility_id
                WHERE p.external_id = $1 AND f.state_id = $2
                "#,
            )
            .bind(external_id)
            .bind(state_id),
            PatientScope::District(district_id) => sqlx::query_as::<_, DbPatient>(
                r#"
                SELECT p.* FROM patients p
                JOIN facilities f ON f.id = p.facility_id
                WHERE p.external_id = $1 AND f.district_id = $2
                "#,
            )
            .bind(external_id)
            .bind(district_id),
            PatientScope::Facilities { user_id } => sqlx::query_as::<_, DbPatient>(
                r#"
                SELECT p.* FROM patients p
                WHERE p.external_id = $1
                  AND (p.created_by = $2
                       OR p.facility_id IN (SELECT facility_id FROM facility_users WHERE user_id = $2))
                "#,
            )
            .bind(external_id)
            .bind(user_id),
        };

        let result = query.fetch_optional(pool).await.map_err(CareError::from)?;
        Ok(result.map(Patient::from))
    }

    /// 查找已关联指定ABHA记录的患者
    pub async fn get_patient_by_abha_number_id(&self, abha_number_id: &Uuid) -> Result<Option<Patient>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbPatient>("SELECT * FROM patients WHERE abha_number_id = $1")
            .bind(abha_number_id)
            .fetch_optional(pool)
            .await
            .map_err(CareError::from)?;

        Ok(result.map(Patient::from))
    }

    /// 关联ABHA记录到患者
    pub async fn set_patient_abha_number(&self, patient_id: &Uuid, abha_number_id: &Uuid) -> Result<()> {
        let pool = self.pool.pool();

        let result = sqlx::query(
            "UPDATE patients SET abha_number_id = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(abha_number_id)
        .bind(patient_id)
        .execute(pool)
        .await
        .map_err(CareError::from)?;

        if result.rows_affected() == 0 {
            return Err(CareError::NotFound(format!("patient {}", patient_id)));
        }
        Ok(())
    }

    // ========== ABHA号码相关操作 ==========

    /// 根据ABHA号码查找记录
    pub async fn get_abha_number(&self, abha_number: &str) -> Result<Option<AbhaNumber>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbAbhaNumber>("SELECT * FROM abha_numbers WHERE abha_number = $1")
            .bind(abha_number)
            .fetch_optional(pool)
            .await
            .map_err(CareError::from)?;

        Ok(result.map(AbhaNumber::from))
    }

    /// 创建ABHA号码记录
    pub async fn create_abha_number(&self, record: &NewAbhaNumber) -> Result<AbhaNumber> {
        let pool = self.pool.pool();

        let row = sqlx::query_as::<_, DbAbhaNumber>(
            r#"
            INSERT INTO abha_numbers (
                id, external_id, abha_number, health_id, email, first_name, middle_name,
                last_name, profile_photo, txn_id, access_token, refresh_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Uuid::new_v4())
        .bind(&record.abha_number)
        .bind(&record.health_id)
        .bind(&record.email)
        .bind(&record.first_name)
        .bind(&record.middle_name)
        .bind(&record.last_name)
        .bind(&record.profile_photo)
        .bind(&record.txn_id)
        .bind(&record.access_token)
        .bind(&record.refresh_token)
        .fetch_one(pool)
        .await
        .map_err(CareError::from)?;

        tracing::info!("Created ABHA number record {}", row.external_id);
        Ok(AbhaNumber::from(row))
    }

    // ========== 资产相关操作 ==========

    /// 创建新资产
    pub async fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
        let pool = self.pool.pool();

        let row = sqlx::query_as::<_, DbAsset>(
            r#"
            INSERT INTO assets (id, external_id, name, facility_id, qr_code_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, external_id, name, facility_id, qr_code_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Uuid::new_v4())
        .bind(&asset.name)
        .bind(asset.facility_id)
        .bind(&asset.qr_code_id)
        .fetch_one(pool)
        .await
        .map_err(CareError::from)?;

        Ok(Asset::from(row))
    }

    /// 根据二维码ID查找资产
    pub async fn get_asset_by_qr_code_id(&self, qr_code_id: &str) -> Result<Option<Asset>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbAsset>(
            "SELECT id, external_id, name, facility_id, qr_code_id, created_at FROM assets WHERE qr_code_id = $1",
        )
        .bind(qr_code_id)
        .fetch_optional(pool)
        .await
        .map_err(CareError::from)?;

        Ok(result.map(Asset::from))
    }
}
