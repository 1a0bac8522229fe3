//! 健康ID业务流程
//!
//! 校验请求体，转发给ABDM网关，创建健康ID时保存返回的ABHA号码并关联患者。

use crate::gateway::HealthIdApi;
use crate::payloads::{
    AadhaarOtpGenerateRequest, AadhaarOtpResendRequest, CreateHealthIdRequest,
    GenerateMobileOtpRequest, RequestPayload, VerifyOtpRequest,
};
use care_core::{AbhaNumber, CareError, CareStore, NewAbhaNumber, Result, User, ValidationErrors};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// 健康ID服务
#[derive(Clone)]
pub struct HealthIdService {
    gateway: Arc<dyn HealthIdApi>,
    store: Arc<dyn CareStore>,
}

impl HealthIdService {
    pub fn new(gateway: Arc<dyn HealthIdApi>, store: Arc<dyn CareStore>) -> Self {
        Self { gateway, store }
    }

    pub fn store(&self) -> &Arc<dyn CareStore> {
        &self.store
    }

    // TODO: rate limit the OTP-generating actions per user before exposing them publicly
    pub async fn generate_aadhaar_otp(&self, data: Value) -> Result<Value> {
        AadhaarOtpGenerateRequest::validate(&data)?;
        self.gateway.generate_aadhaar_otp(&data).await
    }

    pub async fn resend_aadhaar_otp(&self, data: Value) -> Result<Value> {
        AadhaarOtpResendRequest::validate(&data)?;
        self.gateway.resend_aadhaar_otp(&data).await
    }

    pub async fn verify_aadhaar_otp(&self, data: Value) -> Result<Value> {
        VerifyOtpRequest::validate(&data)?;
        self.gateway.verify_aadhaar_otp(&data).await
    }

    pub async fn generate_mobile_otp(&self, data: Value) -> Result<Value> {
        GenerateMobileOtpRequest::validate(&data)?;
        self.gateway.generate_mobile_otp(&data).await
    }

    pub async fn verify_mobile_otp(&self, data: Value) -> Result<Value> {
        VerifyOtpRequest::validate(&data)?;
        self.gateway.verify_mobile_otp(&data).await
    }

    pub async fn check_and_generate_mobile_otp(&self, data: Value) -> Result<Value> {
        GenerateMobileOtpRequest::validate(&data)?;
        self.gateway.check_and_generate_mobile_otp(&data).await
    }

    /// 创建健康ID并关联到患者
    pub async fn create_health_id(&self, user: &User, mut data: Value) -> Result<Value> {
        let request = CreateHealthIdRequest::validate(&data)?;
        if let Value::Object(map) = &mut data {
            map.remove("patientId");
        }

        let patient = self
            .store
            .find_visible_patient(user, request.patient_id)
            .await?
            .ok_or_else(|| {
                warn!(
                    "Patient {} not visible to user {}",
                    request.patient_id, user.username
                );
                CareError::Validation(ValidationErrors::single("patient", "Not Found"))
            })?;

        let response = self.gateway.create_health_id(&data).await?;

        let abha_number = match string_field(&response, "healthIdNumber") {
            Some(number) => number,
            None => {
                return Err(CareError::Internal(
                    "ABDM response is missing healthIdNumber".to_string(),
                ))
            }
        };

        let record = match self.store.find_by_abha_number(&abha_number).await? {
            Some(existing) => existing,
            None => {
                let created = self
                    .store
                    .create_abha_number(&new_abha_number(abha_number, &request, &response))
                    .await?;
                info!("Stored new ABHA number record {}", created.external_id);
                created
            }
        };

        self.ensure_not_linked_elsewhere(&record, patient.id).await?;
        self.store.link_abha_number(patient.id, record.id).await?;
        info!(
            "Linked ABHA number {} to patient {}",
            record.external_id, patient.external_id
        );

        Ok(response)
    }

    async fn ensure_not_linked_elsewhere(&self, record: &AbhaNumber, patient_id: uuid::Uuid) -> Result<()> {
        match self.store.find_patient_by_abha_number(record.id).await? {
            Some(linked) if linked.id != patient_id => Err(CareError::Validation(
                ValidationErrors::single(
                    "patient",
                    "ABHA number is already linked to another patient",
                ),
            )),
            _ => Ok(()),
        }
    }
}

fn new_abha_number(abha_number: String, request: &CreateHealthIdRequest, response: &Value) -> NewAbhaNumber {
    NewAbhaNumber {
        abha_number,
        health_id: string_field(response, "healthId"),
        email: string_field(response, "email"),
        first_name: string_field(response, "firstName"),
        middle_name: string_field(response, "middleName"),
        last_name: string_field(response, "lastName"),
        profile_photo: string_field(response, "profilePhoto"),
        txn_id: Some(request.txn_id.clone()),
        access_token: string_field(response, "token"),
        refresh_token: string_field(response, "refreshToken"),
    }
}

/// 读取非空字符串字段
fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
