//! 健康ID接口请求体定义与校验
//!
//! 校验规则和错误文案与原有Web端保持一致，错误按字段汇总。

use care_core::ValidationErrors;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

/// 可从JSON对象校验得到的请求体
pub trait RequestPayload: Sized {
    fn validate(data: &Value) -> Result<Self, ValidationErrors>;
}

/// 生成Aadhaar OTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AadhaarOtpGenerateRequest {
    /// Aadhaar号码
    pub aadhaar: String,
}

/// 重发Aadhaar OTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AadhaarOtpResendRequest {
    pub txn_id: String,
}

/// 生成手机OTP（也用于V2的检查并生成）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMobileOtpRequest {
    pub mobile: String,
    pub txn_id: String,
}

/// 校验OTP（Aadhaar和手机共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub otp: String,
    pub txn_id: String,
}

/// 创建健康ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHealthIdRequest {
    pub health_id: Option<String>,
    pub txn_id: String,
    pub patient_id: Uuid,
}

impl RequestPayload for AadhaarOtpGenerateRequest {
    fn validate(data: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(data)?;
        let aadhaar = fields.char_field("aadhaar", 12, 16);
        fields.finish()?;
        Ok(Self { aadhaar: aadhaar.unwrap_or_default() })
    }
}

impl RequestPayload for AadhaarOtpResendRequest {
    fn validate(data: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(data)?;
        let txn_id = fields.char_field("txnId", 1, 64);
        fields.finish()?;
        Ok(Self { txn_id: txn_id.unwrap_or_default() })
    }
}

impl RequestPayload for GenerateMobileOtpRequest {
    fn validate(data: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(data)?;
        let mobile = fields.char_field("mobile", 10, 10);
        let txn_id = fields.char_field("txnId", 1, 64);
        fields.finish()?;
        Ok(Self {
            mobile: mobile.unwrap_or_default(),
            txn_id: txn_id.unwrap_or_default(),
        })
    }
}

impl RequestPayload for VerifyOtpRequest {
    fn validate(data: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(data)?;
        let otp = fields.char_field("otp", 6, 6);
        let txn_id = fields.char_field("txnId", 1, 64);
        fields.finish()?;
        Ok(Self {
            otp: otp.unwrap_or_default(),
            txn_id: txn_id.unwrap_or_default(),
        })
    }
}

impl RequestPayload for CreateHealthIdRequest {
    fn validate(data: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(data)?;
        let health_id = fields.optional_char_field("healthId", 1, 64);
        let txn_id = fields.char_field("txnId", 1, 64);
        let patient_id = fields.uuid_field("patientId");
        fields.finish()?;
        Ok(Self {
            health_id,
            txn_id: txn_id.unwrap_or_default(),
            patient_id: patient_id.unwrap_or_default(),
        })
    }
}

/// 字段读取器，累计错误
struct Fields<'a> {
    data: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Fields<'a> {
    fn new(data: &'a Value) -> Result<Self, ValidationErrors> {
        match data {
            Value::Object(map) => Ok(Self {
                data: map,
                errors: ValidationErrors::new(),
            }),
            other => Err(ValidationErrors::single(
                "non_field_errors",
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type_name(other)
                ),
            )),
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn char_field(&mut self, name: &str, min: usize, max: usize) -> Option<String> {
        if !self.data.contains_key(name) {
            self.errors.add(name, "This field is required.");
            return None;
        }
        self.optional_char_field(name, min, max)
    }

    fn optional_char_field(&mut self, name: &str, min: usize, max: usize) -> Option<String> {
        let value = match self.data.get(name)? {
            Value::Null => {
                self.errors.add(name, "This field may not be null.");
                return None;
            }
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.errors.add(name, "Not a valid string.");
                return None;
            }
        };

        if value.is_empty() {
            self.errors.add(name, "This field may not be blank.");
            return None;
        }

        let length = value.chars().count();
        if length > max {
            self.errors.add(
                name,
                format!("Ensure this field has no more than {} characters.", max),
            );
            return None;
        }
        if length < min {
            self.errors.add(
                name,
                format!("Ensure this field has at least {} characters.", min),
            );
            return None;
        }
        Some(value)
    }

    fn uuid_field(&mut self, name: &str) -> Option<Uuid> {
        match self.data.get(name) {
            None => {
                self.errors.add(name, "This field is required.");
                None
            }
            Some(Value::Null) => {
                self.errors.add(name, "This field may not be null.");
                None
            }
            Some(Value::String(s)) => match Uuid::parse_str(s.trim()) {
                Ok(id) => Some(id),
                Err(_) => {
                    self.errors.add(name, "Must be a valid UUID.");
                    None
                }
            },
            Some(_) => {
                self.errors.add(name, "Must be a valid UUID.");
                None
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
