//! 基于PostgreSQL的存储接口实现

use crate::connection::DatabasePool;
use crate::queries::DatabaseQueries;
use async_trait::async_trait;
use care_core::{
    AbhaNumber, AbhaNumberRepository, Asset, AssetRepository, NewAbhaNumber, NewAsset, Patient,
    PatientRepository, Result, User, UserRepository,
};
use uuid::Uuid;

/// PostgreSQL存储
#[derive(Clone)]
pub struct PgStore {
    pool: DatabasePool,
}

impl PgStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn queries(&self) -> DatabaseQueries<'_> {
        DatabaseQueries::new(&self.pool)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        self.queries().get_user_by_token_hash(token_hash).await
    }
}

#[async_trait]
impl PatientRepository for PgStore {
    async fn find_visible_patient(&self, user: &User, external_id: Uuid) -> Result<Option<Patient>> {
        self.queries().get_visible_patient(user, &external_id).await
    }

    async fn find_patient_by_abha_number(&self, abha_number_id: Uuid) -> Result<Option<Patient>> {
        self.queries().get_patient_by_abha_number_id(&abha_number_id).await
    }

    async fn link_abha_number(&self, patient_id: Uuid, abha_number_id: Uuid) -> Result<()> {
        self.queries()
            .set_patient_abha_number(&patient_id, &abha_number_id)
            .await
    }
}

#[async_trait]
impl AbhaNumberRepository for PgStore {
    async fn find_by_abha_number(&self, abha_number: &str) -> Result<Option<AbhaNumber>> {
        self.queries().get_abha_number(abha_number).await
    }

    async fn create_abha_number(&self, new_record: &NewAbhaNumber) -> Result<AbhaNumber> {
        self.queries().create_abha_number(new_record).await
    }
}

#[async_trait]
impl AssetRepository for PgStore {
    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
        self.queries().create_asset(asset).await
    }

    async fn find_asset_by_qr_code_id(&self, qr_code_id: &str) -> Result<Option<Asset>> {
        self.queries().get_asset_by_qr_code_id(qr_code_id).await
    }
}
