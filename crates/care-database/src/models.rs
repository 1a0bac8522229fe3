//! 数据库模型

use care_core::models::*;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// 数据库表模型 - 使用FromRow trait用于SQL查询

/// 数据库ABHA号码表
#[derive(Debug, FromRow)]
pub struct DbAbhaNumber {
    pub id: Uuid,
    pub external_id: Uuid,
    pub abha_number: String,
    pub health_id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_photo: Option<String>,
    pub txn_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbAbhaNumber> for AbhaNumber {
    fn from(row: DbAbhaNumber) -> Self {
        AbhaNumber {
            id: row.id,
            external_id: row.external_id,
            abha_number: row.abha_number,
            health_id: row.health_id,
            email: row.email,
            first_name: row.first_name,
            middle_name: row.middle_name,
            last_name: row.last_name,
            profile_photo: row.profile_photo,
            txn_id: row.txn_id,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// 数据库患者表
#[derive(Debug, FromRow)]
pub struct DbPatient {
    pub id: Uuid,
    pub external_id: Uuid,
    pub name: String,
    pub facility_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub abha_number_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbPatient> for Patient {
    fn from(row: DbPatient) -> Self {
        Patient {
            id: row.id,
            external_id: row.external_id,
            name: row.name,
            facility_id: row.facility_id,
            created_by: row.created_by,
            abha_number_id: row.abha_number_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// 数据库用户表
#[derive(Debug, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub user_type: i16,
    pub district_id: Option<i32>,
    pub state_id: Option<i32>,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        User {
            id: row.id,
            username: row.username,
            user_type: UserType::from_i16(row.user_type),
            district_id: row.district_id,
            state_id: row.state_id,
            is_superuser: row.is_superuser,
            is_active: row.is_active,
        }
    }
}

/// 数据库资产表
#[derive(Debug, FromRow)]
pub struct DbAsset {
    pub id: Uuid,
    pub external_id: Uuid,
    pub name: String,
    pub facility_id: Uuid,
    pub qr_code_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbAsset> for Asset {
    fn from(row: DbAsset) -> Self {
        Asset {
            id: row.id,
            external_id: row.external_id,
            name: row.name,
            facility_id: row.facility_id,
            qr_code_id: row.qr_code_id,
            created_at: row.created_at,
        }
    }
}
