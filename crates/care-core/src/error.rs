//! 错误定义模块

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// 字段级校验错误，按字段名汇总错误信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只包含单个字段错误
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// 没有错误时返回 `Ok(())`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CareError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(" "))?;
            first = false;
        }
        Ok(())
    }
}

/// CARE系统统一错误类型
#[derive(Error, Debug)]
pub enum CareError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("数据冲突: {0}")]
    Conflict(String),

    #[error("验证错误: {0}")]
    Validation(ValidationErrors),

    #[error("未认证: {0}")]
    Unauthorized(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("ABDM网关返回错误状态 {status}")]
    Gateway { status: u16, body: serde_json::Value },

    #[error("HTTP请求错误: {0}")]
    Http(String),

    #[error("网络错误: {0}")]
    Network(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for CareError {
    fn from(errors: ValidationErrors) -> Self {
        CareError::Validation(errors)
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for CareError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                CareError::Conflict(db_err.message().to_string())
            }
            _ => CareError::Database(err.to_string()),
        }
    }
}

/// CARE系统统一结果类型
pub type Result<T> = std::result::Result<T, CareError>;
