//! 存储接口定义
//!
//! 业务层只依赖这些trait，PostgreSQL实现位于 `care-database`。

use crate::error::Result;
use crate::models::{AbhaNumber, Asset, NewAbhaNumber, NewAsset, Patient, User};
use async_trait::async_trait;
use uuid::Uuid;

/// 用户查询
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 根据API令牌摘要查找用户
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>>;
}

/// 患者查询与更新
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// 在用户可见范围内按外部ID查找患者
    async fn find_visible_patient(&self, user: &User, external_id: Uuid) -> Result<Option<Patient>>;

    /// 查找已关联指定ABHA记录的患者
    async fn find_patient_by_abha_number(&self, abha_number_id: Uuid) -> Result<Option<Patient>>;

    /// 将ABHA记录关联到患者
    async fn link_abha_number(&self, patient_id: Uuid, abha_number_id: Uuid) -> Result<()>;
}

/// ABHA号码记录
#[async_trait]
pub trait AbhaNumberRepository: Send + Sync {
    async fn find_by_abha_number(&self, abha_number: &str) -> Result<Option<AbhaNumber>>;

    async fn create_abha_number(&self, new_record: &NewAbhaNumber) -> Result<AbhaNumber>;
}

/// 医疗设备资产
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// 创建资产，二维码ID重复时返回 `Conflict`
    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset>;

    async fn find_asset_by_qr_code_id(&self, qr_code_id: &str) -> Result<Option<Asset>>;
}

/// 健康ID流程所需的全部存储能力
pub trait CareStore: UserRepository + PatientRepository + AbhaNumberRepository {}

impl<T> CareStore for T where T: UserRepository + PatientRepository + AbhaNumberRepository {}

#[cfg(any(test, feature = "test-util"))]
pub mod memory {
    //! 内存存储实现，供测试使用

    use super::*;
    use crate::error::CareError;
    use crate::models::Facility;
    use crate::scope::PatientScope;
    use crate::utils::hash_token;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MemoryState {
        users: HashMap<String, User>,
        facilities: HashMap<Uuid, Facility>,
        memberships: HashMap<Uuid, Vec<Uuid>>,
        patients: HashMap<Uuid, Patient>,
        abha_numbers: HashMap<Uuid, AbhaNumber>,
        assets: HashMap<String, Asset>,
    }

    /// 内存存储
    #[derive(Default)]
    pub struct MemoryStore {
        state: RwLock<MemoryState>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// 注册用户及其明文令牌
        pub async fn add_user(&self, user: User, token: &str) {
            self.state.write().await.users.insert(hash_token(token), user);
        }

        pub async fn add_facility(&self, facility: Facility) {
            self.state.write().await.facilities.insert(facility.id, facility);
        }

        pub async fn add_member(&self, user_id: Uuid, facility_id: Uuid) {
            self.state
                .write()
                .await
                .memberships
                .entry(user_id)
                .or_default()
                .push(facility_id);
        }

        pub async fn add_patient(&self, patient: Patient) {
            self.state.write().await.patients.insert(patient.id, patient);
        }

        pub async fn patient(&self, id: Uuid) -> Option<Patient> {
            self.state.read().await.patients.get(&id).cloned()
        }

        pub async fn abha_numbers(&self) -> Vec<AbhaNumber> {
            self.state.read().await.abha_numbers.values().cloned().collect()
        }
    }

    #[async_trait]
    impl UserRepository for MemoryStore {
        async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
            Ok(self.state.read().await.users.get(token_hash).cloned())
        }
    }

    #[async_trait]
    impl PatientRepository for MemoryStore {
        async fn find_visible_patient(&self, user: &User, external_id: Uuid) -> Result<Option<Patient>> {
            let state = self.state.read().await;
            let scope = PatientScope::for_user(user);
            let members = state.memberships.get(&user.id).cloned().unwrap_or_default();

            Ok(state
                .patients
                .values()
                .find(|p| {
                    let facility = p.facility_id.and_then(|id| state.facilities.get(&id));
                    p.external_id == external_id && scope.admits(p, facility, &members)
                })
                .cloned())
        }

        async fn find_patient_by_abha_number(&self, abha_number_id: Uuid) -> Result<Option<Patient>> {
            Ok(self
                .state
                .read()
                .await
                .patients
                .values()
                .find(|p| p.abha_number_id == Some(abha_number_id))
                .cloned())
        }

        async fn link_abha_number(&self, patient_id: Uuid, abha_number_id: Uuid) -> Result<()> {
            let mut state = self.state.write().await;
            if state
                .patients
                .values()
                .any(|p| p.id != patient_id && p.abha_number_id == Some(abha_number_id))
            {
                return Err(CareError::Conflict(format!(
                    "abha number {} already linked",
                    abha_number_id
                )));
            }
            let patient = state
                .patients
                .get_mut(&patient_id)
                .ok_or_else(|| CareError::NotFound(format!("patient {}", patient_id)))?;
            patient.abha_number_id = Some(abha_number_id);
            patient.updated_at = Utc::now();
            Ok(())
        }
    }

    #[async_trait]
    impl AbhaNumberRepository for MemoryStore {
        async fn find_by_abha_number(&self, abha_number: &str) -> Result<Option<AbhaNumber>> {
            Ok(self
                .state
                .read()
                .await
                .abha_numbers
                .values()
                .find(|a| a.abha_number == abha_number)
                .cloned())
        }

        async fn create_abha_number(&self, new_record: &NewAbhaNumber) -> Result<AbhaNumber> {
            let mut state = self.state.write().await;
            if state
                .abha_numbers
                .values()
                .any(|a| a.abha_number == new_record.abha_number)
            {
                return Err(CareError::Conflict(format!(
                    "abha number {} already exists",
                    new_record.abha_number
                )));
            }

            let now = Utc::now();
            let record = AbhaNumber {
                id: Uuid::new_v4(),
                external_id: Uuid::new_v4(),
                abha_number: new_record.abha_number.clone(),
                health_id: new_record.health_id.clone(),
                email: new_record.email.clone(),
                first_name: new_record.first_name.clone(),
                middle_name: new_record.middle_name.clone(),
                last_name: new_record.last_name.clone(),
                profile_photo: new_record.profile_photo.clone(),
                txn_id: new_record.txn_id.clone(),
                access_token: new_record.access_token.clone(),
                refresh_token: new_record.refresh_token.clone(),
                created_at: now,
                updated_at: now,
            };
            state.abha_numbers.insert(record.id, record.clone());
            Ok(record)
        }
    }

    #[async_trait]
    impl AssetRepository for MemoryStore {
        async fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
            let mut state = self.state.write().await;
            if state.assets.contains_key(&asset.qr_code_id) {
                return Err(CareError::Conflict(format!(
                    "asset qr code {} already exists",
                    asset.qr_code_id
                )));
            }

            let record = Asset {
                id: Uuid::new_v4(),
                external_id: Uuid::new_v4(),
                name: asset.name.clone(),
                facility_id: asset.facility_id,
                qr_code_id: asset.qr_code_id.clone(),
                created_at: Utc::now(),
            };
            state.assets.insert(record.qr_code_id.clone(), record.clone());
            Ok(record)
        }

        async fn find_asset_by_qr_code_id(&self, qr_code_id: &str) -> Result<Option<Asset>> {
            Ok(self.state.read().await.assets.get(qr_code_id).cloned())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::models::UserType;

        fn staff() -> User {
            User {
                id: Uuid::new_v4(),
                username: "staff".to_string(),
                user_type: UserType::STAFF,
                district_id: None,
                state_id: None,
                is_superuser: false,
                is_active: true,
            }
        }

        fn patient(facility_id: Option<Uuid>) -> Patient {
            Patient {
                id: Uuid::new_v4(),
                external_id: Uuid::new_v4(),
                name: "Ravi".to_string(),
                facility_id,
                created_by: None,
                abha_number_id: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }
        }

        #[tokio::test]
        async fn test_find_user_by_token() {
            let store = MemoryStore::new();
            let user = staff();
            store.add_user(user.clone(), "token-1").await;

            let found = store.find_user_by_token_hash(&hash_token("token-1")).await.unwrap();
            assert_eq!(found, Some(user));
            assert!(store.find_user_by_token_hash("nope").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_visible_patient_respects_membership() {
            let store = MemoryStore::new();
            let user = staff();
            let facility = Facility {
                id: Uuid::new_v4(),
                name: "CHC".to_string(),
                district_id: 1,
                state_id: 1,
            };
            let p = patient(Some(facility.id));
            store.add_facility(facility.clone()).await;
            store.add_patient(p.clone()).await;

            assert!(store.find_visible_patient(&user, p.external_id).await.unwrap().is_none());

            store.add_member(user.id, facility.id).await;
            assert_eq!(
                store.find_visible_patient(&user, p.external_id).await.unwrap(),
                Some(p)
            );
        }

        #[tokio::test]
        async fn test_abha_number_unique() {
            let store = MemoryStore::new();
            let new_record = NewAbhaNumber {
                abha_number: "91-1234-5678-9012".to_string(),
                ..Default::default()
            };
            store.create_abha_number(&new_record).await.unwrap();
            let err = store.create_abha_number(&new_record).await.unwrap_err();
            assert!(matches!(err, CareError::Conflict(_)));
        }

        #[tokio::test]
        async fn test_link_is_one_to_one() {
            let store = MemoryStore::new();
            let first = patient(None);
            let second = patient(None);
            store.add_patient(first.clone()).await;
            store.add_patient(second.clone()).await;

            let abha_id = Uuid::new_v4();
            store.link_abha_number(first.id, abha_id).await.unwrap();
            assert!(store.link_abha_number(second.id, abha_id).await.is_err());
            assert_eq!(
                store.find_patient_by_abha_number(abha_id).await.unwrap().map(|p| p.id),
                Some(first.id)
            );
        }

        #[tokio::test]
        async fn test_asset_qr_code_id_defaults_and_is_unique() {
            let store = MemoryStore::new();
            let facility_id = Uuid::new_v4();

            let first = store
                .create_asset(&NewAsset::new("Ventilator", facility_id, None))
                .await
                .unwrap();
            let second = store
                .create_asset(&NewAsset::new("Ventilator", facility_id, None))
                .await
                .unwrap();
            assert_ne!(first.qr_code_id, second.qr_code_id);
            assert!(Uuid::parse_str(&first.qr_code_id).is_ok());

            let found = store.find_asset_by_qr_code_id(&first.qr_code_id).await.unwrap();
            assert_eq!(found, Some(first.clone()));

            let duplicate = NewAsset::new("Monitor", facility_id, Some(first.qr_code_id));
            assert!(matches!(
                store.create_asset(&duplicate).await,
                Err(CareError::Conflict(_))
            ));
        }
    }
}
