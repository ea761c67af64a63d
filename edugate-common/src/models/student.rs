use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::code_pool::PoolEntitlements;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub university_id: Option<Uuid>,
    pub college_id: Option<Uuid>,
    pub year: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub admin_id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// The record, owned by a student, of having consumed one code from one pool.
/// Created only by a committed redemption and never edited afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub redemption_id: Uuid,
    pub student_id: Uuid,
    pub pool_id: Uuid,
    pub code_value: String,
    pub redeemed_at: DateTime<Utc>,
}

impl Redemption {
    pub fn new(student_id: Uuid, pool_id: Uuid, code_value: &str, redeemed_at: DateTime<Utc>) -> Self {
        Self {
            redemption_id: Uuid::new_v4(),
            student_id,
            pool_id,
            code_value: code_value.to_string(),
            redeemed_at,
        }
    }
}

/// Confirmation payload of a successful redemption.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionReceipt {
    pub code: String,
    pub pool_id: Uuid,
    pub pool_name: String,
    #[serde(flatten)]
    pub entitlements: PoolEntitlements,
    pub expiration: DateTime<Utc>,
    pub redeemed_at: DateTime<Utc>,
}

/// Pool metadata shown next to a redemption in the student's history.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedeemedPoolInfo {
    pub name: String,
    pub expiration: DateTime<Utc>,
    #[serde(flatten)]
    pub entitlements: PoolEntitlements,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionHistoryEntry {
    pub code: String,
    pub pool_id: Uuid,
    pub redeemed_at: DateTime<Utc>,
    /// `None` when the pool has since been deleted.
    pub pool: Option<RedeemedPoolInfo>,
    /// The claim still re-validates: pool present, not expired, code used.
    pub is_active: bool,
}
