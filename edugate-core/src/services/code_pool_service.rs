// File: src/services/code_pool_service.rs

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand_core::TryRngCore;
use tracing::{info, warn};
use uuid::Uuid;

use edugate_common::error::{ConflictCause, FieldError};
use edugate_common::models::{
    CODE_LENGTH, CodePool, CodeUsageFilter, NewCodePool, Page, PageRequest, PoolCodes,
    PoolCreated, PoolDeletion, PoolFilter, PoolSummary,
};
use edugate_common::traits::{CatalogRepository, CodePoolRepository};

use crate::Error;

/// 32 symbols: upper-case letters without I and O, digits without 0 and 1.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Fresh batches tried after the first one collides.
const MAX_COLLISION_RETRIES: usize = 3;

/// Draws one code from the OS RNG. 256 is a multiple of the alphabet size,
/// so `byte % 32` is unbiased.
pub fn generate_code() -> Result<String, Error> {
    let mut bytes = [0u8; CODE_LENGTH];
    let mut rng = OsRng;
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Encryption(e.to_string()))?;
    Ok(bytes
        .iter()
        .map(|b| CODE_ALPHABET[usize::from(*b) % CODE_ALPHABET.len()] as char)
        .collect())
}

/// `count` codes, distinct among themselves.
pub fn generate_batch(count: usize) -> Result<Vec<String>, Error> {
    let mut seen = HashSet::with_capacity(count);
    let mut batch = Vec::with_capacity(count);
    while batch.len() < count {
        let code = generate_code()?;
        if seen.insert(code.clone()) {
            batch.push(code);
        }
    }
    Ok(batch)
}

pub struct CodePoolService {
    pool_repo: Arc<dyn CodePoolRepository + Send + Sync>,
    catalog_repo: Arc<dyn CatalogRepository + Send + Sync>,
}

impl CodePoolService {
    pub fn new(
        pool_repo: Arc<dyn CodePoolRepository + Send + Sync>,
        catalog_repo: Arc<dyn CatalogRepository + Send + Sync>,
    ) -> Self {
        Self {
            pool_repo,
            catalog_repo,
        }
    }

    pub async fn create_pool(&self, req: NewCodePool) -> Result<PoolCreated, Error> {
        self.create_pool_at(req, Utc::now()).await
    }

    /// Validates the request, checks every referenced material and course
    /// exists, then persists the pool with `code_count` fresh codes.
    pub async fn create_pool_at(&self, req: NewCodePool, now: DateTime<Utc>) -> Result<PoolCreated, Error> {
        req.validate(now)?;

        let entitlements = req.entitlements.deduplicated();
        self.check_entitlements_exist(&entitlements.all_materials(), &entitlements.courses)
            .await?;

        let pool = CodePool {
            pool_id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            expiration: req.expiration,
            entitlements,
            created_at: now,
        };
        let count = req.code_count as usize;

        for attempt in 0..=MAX_COLLISION_RETRIES {
            let codes = generate_batch(count)?;
            match self.pool_repo.create_pool(&pool, &codes).await {
                Ok(()) => {
                    info!(pool_id = %pool.pool_id, name = %pool.name, codes = count, "Created codes group");
                    return Ok(PoolCreated {
                        pool_id: pool.pool_id,
                        name: pool.name,
                        code_count: count,
                        expiration: pool.expiration,
                    });
                }
                Err(Error::Conflict(ConflictCause::CodeCollision)) => {
                    warn!(pool_id = %pool.pool_id, attempt, "Generated code collided; regenerating batch");
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::Conflict(ConflictCause::CodeCollision))
    }

    async fn check_entitlements_exist(&self, materials: &[Uuid], courses: &[Uuid]) -> Result<(), Error> {
        let mut errors = Vec::new();

        if !materials.is_empty() {
            let found: BTreeSet<Uuid> = self
                .catalog_repo
                .existing_material_ids(materials)
                .await?
                .into_iter()
                .collect();
            let missing: Vec<String> = materials
                .iter()
                .filter(|id| !found.contains(*id))
                .map(|id| id.to_string())
                .collect();
            if !missing.is_empty() {
                errors.push(FieldError::new(
                    "materials",
                    format!("Unknown materials: {}", missing.join(", ")),
                ));
            }
        }

        if !courses.is_empty() {
            let found: BTreeSet<Uuid> = self
                .catalog_repo
                .existing_course_ids(courses)
                .await?
                .into_iter()
                .collect();
            let missing: Vec<String> = courses
                .iter()
                .filter(|id| !found.contains(*id))
                .map(|id| id.to_string())
                .collect();
            if !missing.is_empty() {
                errors.push(FieldError::new(
                    "courses",
                    format!("Unknown courses: {}", missing.join(", ")),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }

    pub async fn list_pools(&self, filter: &PoolFilter, page: PageRequest) -> Result<Page<PoolSummary>, Error> {
        if let (Some(from), Some(to)) = (filter.expiration_from, filter.expiration_to) {
            if from > to {
                return Err(Error::invalid(
                    "expiration",
                    "expiration range start must not be after its end",
                ));
            }
        }
        self.pool_repo.list_pools(filter, page).await
    }

    /// One page of a pool's codes. `total_codes` counts codes matching the
    /// usage filter; `total_used` counts used codes in the whole pool.
    pub async fn get_pool_codes(
        &self,
        pool_id: Uuid,
        usage: CodeUsageFilter,
        page: PageRequest,
    ) -> Result<PoolCodes, Error> {
        let pool = self
            .pool_repo
            .get_pool(pool_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("codes group {pool_id}")))?;

        let codes = self.pool_repo.list_codes(pool_id).await?;
        let total_used = codes.iter().filter(|c| c.is_used).count();
        let matching: Vec<_> = codes.into_iter().filter(|c| usage.matches(c)).collect();
        let total_codes = matching.len();
        let slice = Page::from_vec(matching, page);

        Ok(PoolCodes {
            pool_id: pool.pool_id,
            name: pool.name,
            expiration: pool.expiration,
            total_codes,
            total_used,
            codes: slice.docs,
            filter: usage,
        })
    }

    /// Refused while any code of the pool is used. Otherwise removes the
    /// pool, its codes and every student's redemption of it together.
    pub async fn delete_pool(&self, pool_id: Uuid) -> Result<PoolDeletion, Error> {
        let deletion = self.pool_repo.delete_pool_cascade(pool_id).await?;
        info!(
            %pool_id,
            codes_removed = deletion.codes_removed,
            redemptions_removed = deletion.redemptions_removed,
            "Deleted codes group"
        );
        Ok(deletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_use_the_alphabet() {
        let code = generate_code().unwrap();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert!(!code.contains('I') && !code.contains('O') && !code.contains('0'));
    }

    #[test]
    fn batches_are_distinct() {
        let batch = generate_batch(500).unwrap();
        let unique: HashSet<_> = batch.iter().collect();
        assert_eq!(unique.len(), 500);
    }
}
