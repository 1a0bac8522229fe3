//! 核心数据模型定义

use crate::utils::generate_random_asset_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ABHA号码（国家数字健康标识）记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbhaNumber {
    pub id: Uuid,
    pub external_id: Uuid,
    pub abha_number: String,             // 14位健康ID号码，唯一
    pub health_id: Option<String>,       // 健康ID地址，例如 name@abdm
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_photo: Option<String>,   // base64编码的照片
    pub txn_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建ABHA号码记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAbhaNumber {
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
}

/// 患者基本信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub external_id: Uuid,              // 对外暴露的患者ID
    pub name: String,
    pub facility_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub abha_number_id: Option<Uuid>,   // 一对一关联
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 医疗机构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub district_id: i32,
    pub state_id: i32,
}

/// 用户类型，保留数据库中的原始数值
///
/// 数值越大权限越高，未列出的中间值（如只读管理员）按数值参与比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserType(i16);

impl UserType {
    pub const STAFF_READ_ONLY: UserType = UserType(9);
    pub const STAFF: UserType = UserType(10);
    pub const DOCTOR: UserType = UserType(15);
    pub const DISTRICT_LAB_ADMIN: UserType = UserType(25);
    pub const DISTRICT_READ_ONLY_ADMIN: UserType = UserType(29);
    pub const DISTRICT_ADMIN: UserType = UserType(30);
    pub const STATE_LAB_ADMIN: UserType = UserType(35);
    pub const STATE_READ_ONLY_ADMIN: UserType = UserType(39);
    pub const STATE_ADMIN: UserType = UserType(40);

    /// 数据库中的存储值
    pub fn as_i16(self) -> i16 {
        self.0
    }

    pub fn from_i16(value: i16) -> Self {
        UserType(value)
    }
}

/// 系统用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub user_type: UserType,
    pub district_id: Option<i32>,
    pub state_id: Option<i32>,
    pub is_superuser: bool,
    pub is_active: bool,
}

/// 医疗设备资产
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub external_id: Uuid,
    pub name: String,
    pub facility_id: Uuid,
    pub qr_code_id: String, // 最长1024字符，唯一
    pub created_at: DateTime<Utc>,
}

/// 新资产，未指定二维码ID时使用随机资产ID
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub facility_id: Uuid,
    pub qr_code_id: String,
}

impl NewAsset {
    pub fn new(name: impl Into<String>, facility_id: Uuid, qr_code_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            facility_id,
            qr_code_id: qr_code_id.unwrap_or_else(generate_random_asset_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_ordering() {
        assert!(UserType::STAFF < UserType::DISTRICT_LAB_ADMIN);
        assert!(UserType::DISTRICT_ADMIN < UserType::STATE_LAB_ADMIN);
        assert!(UserType::STATE_ADMIN > UserType::STATE_READ_ONLY_ADMIN);
        assert!(UserType::from_i16(29) > UserType::DISTRICT_LAB_ADMIN);
        assert!(UserType::from_i16(29) < UserType::DISTRICT_ADMIN);
    }

    #[test]
    fn test_user_type_keeps_stored_value() {
        assert_eq!(UserType::STATE_READ_ONLY_ADMIN.as_i16(), 39);
        assert_eq!(UserType::from_i16(21).as_i16(), 21);
        assert_eq!(serde_json::to_value(UserType::DOCTOR).unwrap(), serde_json::json!(15));
    }

    #[test]
    fn test_new_asset_default_qr_code_id() {
        let facility_id = Uuid::new_v4();
        let a = NewAsset::new("Ventilator", facility_id, None);
        let b = NewAsset::new("Ventilator", facility_id, None);
        assert_ne!(a.qr_code_id, b.qr_code_id);

        let fixed = NewAsset::new("Monitor", facility_id, Some("QR-001".to_string()));
        assert_eq!(fixed.qr_code_id, "QR-001");
    }
}
