//! 通用工具函数

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// 生成资产二维码ID的默认值
pub fn generate_random_asset_id() -> String {
    Uuid::new_v4().to_string()
}

/// 计算API令牌的SHA-256摘要（十六进制）
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
