// File: src/services/entitlement_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use edugate_common::models::{Code, CodePool, EntitlementSet, Redemption};
use edugate_common::traits::{AccountRepository, CodePoolRepository};

use crate::Error;

/// A redemption is only a claim. It holds while its pool still exists and
/// has not expired, and its code is still used and still belongs to that pool.
pub fn claim_holds(
    redemption: &Redemption,
    pool: Option<&CodePool>,
    code: Option<&Code>,
    now: DateTime<Utc>,
) -> bool {
    let (Some(pool), Some(code)) = (pool, code) else {
        return false;
    };
    pool.pool_id == redemption.pool_id
        && !pool.is_expired_at(now)
        && code.is_used
        && code.pool_id == redemption.pool_id
}

/// Computes what a student may open right now from their redemption history.
pub struct EntitlementService {
    pool_repo: Arc<dyn CodePoolRepository + Send + Sync>,
    account_repo: Arc<dyn AccountRepository + Send + Sync>,
}

impl EntitlementService {
    pub fn new(
        pool_repo: Arc<dyn CodePoolRepository + Send + Sync>,
        account_repo: Arc<dyn AccountRepository + Send + Sync>,
    ) -> Self {
        Self {
            pool_repo,
            account_repo,
        }
    }

    pub async fn resolve_access(&self, student_id: Uuid) -> Result<EntitlementSet, Error> {
        self.resolve_access_at(student_id, Utc::now()).await
    }

    /// Re-validates every redemption against current pool and code state and
    /// unions the grants of the ones that hold. Read-only.
    pub async fn resolve_access_at(&self, student_id: Uuid, now: DateTime<Utc>) -> Result<EntitlementSet, Error> {
        if self.account_repo.get_student(student_id).await?.is_none() {
            return Err(Error::NotFound(format!("student {student_id}")));
        }

        let redemptions = self.account_repo.list_redemptions(student_id).await?;
        let mut pools: HashMap<Uuid, Option<CodePool>> = HashMap::new();
        let mut set = EntitlementSet::default();

        for redemption in &redemptions {
            if !pools.contains_key(&redemption.pool_id) {
                let pool = self.pool_repo.get_pool(redemption.pool_id).await?;
                pools.insert(redemption.pool_id, pool);
            }
            let pool = pools.get(&redemption.pool_id).and_then(Option::as_ref);
            let code = self.pool_repo.get_code(&redemption.code_value).await?;

            if claim_holds(redemption, pool, code.as_ref(), now) {
                if let Some(pool) = pool {
                    set.absorb(pool.pool_id, &pool.entitlements);
                }
            } else {
                debug!(%student_id, pool_id = %redemption.pool_id, "Skipping redemption that no longer validates");
            }
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use edugate_common::models::PoolEntitlements;

    fn fixture(expiration: DateTime<Utc>) -> (Redemption, CodePool, Code) {
        let pool = CodePool {
            pool_id: Uuid::new_v4(),
            name: "Physics".into(),
            expiration,
            entitlements: PoolEntitlements::default(),
            created_at: Utc::now(),
        };
        let code = Code {
            code_value: "ABCDEFGHJKLM".into(),
            pool_id: pool.pool_id,
            is_used: true,
            used_at: Some(Utc::now()),
        };
        let redemption = Redemption::new(Uuid::new_v4(), pool.pool_id, &code.code_value, Utc::now());
        (redemption, pool, code)
    }

    #[test]
    fn claim_requires_live_pool_and_used_code() {
        let now = Utc::now();
        let (r, pool, code) = fixture(now + Duration::days(1));
        assert!(claim_holds(&r, Some(&pool), Some(&code), now));
        assert!(!claim_holds(&r, None, Some(&code), now));
        assert!(!claim_holds(&r, Some(&pool), None, now));

        let mut revoked = code.clone();
        revoked.is_used = false;
        assert!(!claim_holds(&r, Some(&pool), Some(&revoked), now));

        let mut moved = code.clone();
        moved.pool_id = Uuid::new_v4();
        assert!(!claim_holds(&r, Some(&pool), Some(&moved), now));
    }

    #[test]
    fn claim_fails_at_expiration_instant() {
        let now = Utc::now();
        let (r, pool, code) = fixture(now);
        assert!(!claim_holds(&r, Some(&pool), Some(&code), now));
    }
}
