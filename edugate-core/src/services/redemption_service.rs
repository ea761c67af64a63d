// File: src/services/redemption_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use edugate_common::models::{
    CodePool, RedeemedPoolInfo, Redemption, RedemptionHistoryEntry, RedemptionReceipt,
    normalize_code,
};
use edugate_common::traits::{AccountRepository, CodePoolRepository, RedemptionStore, RedemptionUnit};

use crate::Error;
use crate::services::entitlement_service::claim_holds;

/// Consumes codes on behalf of students.
///
/// Each redemption is one unit of work: the code is marked used and the
/// redemption recorded together, or neither happens.
pub struct RedemptionService {
    store: Arc<dyn RedemptionStore + Send + Sync>,
    pool_repo: Arc<dyn CodePoolRepository + Send + Sync>,
    account_repo: Arc<dyn AccountRepository + Send + Sync>,
}

impl RedemptionService {
    pub fn new(
        store: Arc<dyn RedemptionStore + Send + Sync>,
        pool_repo: Arc<dyn CodePoolRepository + Send + Sync>,
        account_repo: Arc<dyn AccountRepository + Send + Sync>,
    ) -> Self {
        Self {
            store,
            pool_repo,
            account_repo,
        }
    }

    pub async fn redeem(&self, student_id: Uuid, raw_code: &str) -> Result<RedemptionReceipt, Error> {
        self.redeem_at(student_id, raw_code, Utc::now()).await
    }

    /// Redeems `raw_code` for `student_id` as of `now`.
    ///
    /// The input is checked before any storage is touched. A failure at any
    /// later step rolls the whole unit back.
    pub async fn redeem_at(
        &self,
        student_id: Uuid,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<RedemptionReceipt, Error> {
        let code_value = normalize_code(raw_code)?;

        let mut unit = self.store.begin().await?;
        let outcome = Self::apply(unit.as_mut(), student_id, &code_value, now).await;
        match outcome {
            Ok(receipt) => {
                unit.commit().await?;
                info!(%student_id, pool_id = %receipt.pool_id, "Redemption committed");
                Ok(receipt)
            }
            Err(e) => {
                if let Err(rb) = unit.rollback().await {
                    warn!(%student_id, "Rollback after failed redemption also failed: {}", rb);
                }
                warn!(%student_id, "Redemption rejected: {}", e);
                Err(e)
            }
        }
    }

    async fn apply(
        unit: &mut dyn RedemptionUnit,
        student_id: Uuid,
        code_value: &str,
        now: DateTime<Utc>,
    ) -> Result<RedemptionReceipt, Error> {
        let lookup = unit
            .lock_code(code_value)
            .await?
            .ok_or_else(|| Error::NotFound("code".to_string()))?;

        if lookup.code.is_used {
            return Err(Error::CodeAlreadyUsed);
        }
        // Checked even though the code is unused.
        if lookup.pool.is_expired_at(now) {
            return Err(Error::PoolExpired);
        }

        let existing = unit
            .lock_student_redemptions(student_id)
            .await?
            .ok_or_else(|| Error::Unauthorized("student does not exist".to_string()))?;
        if existing.iter().any(|r| r.pool_id == lookup.pool.pool_id) {
            return Err(Error::DuplicateRedemptionInPool);
        }

        if !unit.mark_code_used(code_value, now).await? {
            return Err(Error::CodeAlreadyUsed);
        }
        let redemption = Redemption::new(student_id, lookup.pool.pool_id, code_value, now);
        unit.append_redemption(&redemption).await?;

        let pool = lookup.pool;
        Ok(RedemptionReceipt {
            code: redemption.code_value,
            pool_id: pool.pool_id,
            pool_name: pool.name,
            entitlements: pool.entitlements,
            expiration: pool.expiration,
            redeemed_at: now,
        })
    }

    pub async fn redemption_history(&self, student_id: Uuid) -> Result<Vec<RedemptionHistoryEntry>, Error> {
        self.redemption_history_at(student_id, Utc::now()).await
    }

    /// The student's redemptions, oldest first, each with its pool's current
    /// metadata and whether the claim still holds.
    pub async fn redemption_history_at(
        &self,
        student_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<RedemptionHistoryEntry>, Error> {
        if self.account_repo.get_student(student_id).await?.is_none() {
            return Err(Error::NotFound(format!("student {student_id}")));
        }

        let redemptions = self.account_repo.list_redemptions(student_id).await?;
        let mut pools: HashMap<Uuid, Option<CodePool>> = HashMap::new();
        let mut entries = Vec::with_capacity(redemptions.len());

        for r in redemptions {
            if !pools.contains_key(&r.pool_id) {
                let pool = self.pool_repo.get_pool(r.pool_id).await?;
                pools.insert(r.pool_id, pool);
            }
            let pool = pools.get(&r.pool_id).and_then(Option::as_ref);
            let code = self.pool_repo.get_code(&r.code_value).await?;
            let is_active = claim_holds(&r, pool, code.as_ref(), now);

            entries.push(RedemptionHistoryEntry {
                code: r.code_value,
                pool_id: r.pool_id,
                redeemed_at: r.redeemed_at,
                pool: pool.map(|p| RedeemedPoolInfo {
                    name: p.name.clone(),
                    expiration: p.expiration,
                    entitlements: p.entitlements.clone(),
                }),
                is_active,
            });
        }

        Ok(entries)
    }
}
