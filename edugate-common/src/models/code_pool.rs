// File: edugate-common/src/models/code_pool.rs

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, FieldError};

/// Every code is exactly this many characters long.
pub const CODE_LENGTH: usize = 12;

/// Upper bound on codes generated for a single pool.
pub const MAX_CODES_PER_POOL: u32 = 10_000;

pub const MAX_POOL_NAME_LEN: usize = 100;

/// The materials and courses a pool unlocks.
///
/// Materials are split by what they unlock: the question bank, the lecture
/// files, or both (a material may appear in both lists).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntitlements {
    #[serde(default)]
    pub materials_with_questions: Vec<Uuid>,
    #[serde(default)]
    pub materials_with_lectures: Vec<Uuid>,
    #[serde(default)]
    pub courses: Vec<Uuid>,
}

impl PoolEntitlements {
    /// Drops duplicate ids while keeping first-seen order.
    pub fn deduplicated(&self) -> Self {
        fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
            let mut seen = BTreeSet::new();
            ids.iter().copied().filter(|id| seen.insert(*id)).collect()
        }
        Self {
            materials_with_questions: dedup(&self.materials_with_questions),
            materials_with_lectures: dedup(&self.materials_with_lectures),
            courses: dedup(&self.courses),
        }
    }

    /// Every material referenced by either list, once.
    pub fn all_materials(&self) -> Vec<Uuid> {
        let mut set = BTreeSet::new();
        set.extend(self.materials_with_questions.iter().copied());
        set.extend(self.materials_with_lectures.iter().copied());
        set.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.materials_with_questions.is_empty()
            && self.materials_with_lectures.is_empty()
            && self.courses.is_empty()
    }
}

/// A named, time-boxed batch of single-use codes sharing one entitlement set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodePool {
    pub pool_id: Uuid,
    pub name: String,
    pub expiration: DateTime<Utc>,
    #[serde(flatten)]
    pub entitlements: PoolEntitlements,
    pub created_at: DateTime<Utc>,
}

impl CodePool {
    /// A pool whose expiration is `now` or earlier redeems nothing.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }
}

/// One single-use token. `code_value` is unique across all pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Code {
    pub code_value: String,
    pub pool_id: Uuid,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

/// A code together with the pool that owns it, as read inside a redemption.
#[derive(Debug, Clone)]
pub struct CodeLookup {
    pub code: Code,
    pub pool: CodePool,
}

/// Admin request to create a pool and all of its codes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCodePool {
    pub name: String,
    #[serde(flatten)]
    pub entitlements: PoolEntitlements,
    pub code_count: u32,
    pub expiration: DateTime<Utc>,
}

impl NewCodePool {
    /// Field checks that need no storage access.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), Error> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Group name is required"));
        } else if name.chars().count() > MAX_POOL_NAME_LEN {
            errors.push(FieldError::new(
                "name",
                format!("Name must be less than {} characters", MAX_POOL_NAME_LEN),
            ));
        }

        if self.code_count < 1 || self.code_count > MAX_CODES_PER_POOL {
            errors.push(FieldError::new(
                "codeCount",
                format!("Code count must be between 1 and {}", MAX_CODES_PER_POOL),
            ));
        }

        if self.expiration <= now {
            errors.push(FieldError::new("expiration", "Expiration must be in the future"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

/// What the admin gets back after creating a pool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCreated {
    pub pool_id: Uuid,
    pub name: String,
    pub code_count: usize,
    pub expiration: DateTime<Utc>,
}

/// A pool plus its usage counters, for admin listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSummary {
    #[serde(flatten)]
    pub pool: CodePool,
    pub total_codes: i64,
    pub used_codes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeUsageFilter {
    #[default]
    All,
    Used,
    Unused,
}

impl CodeUsageFilter {
    pub fn matches(&self, code: &Code) -> bool {
        match self {
            CodeUsageFilter::All => true,
            CodeUsageFilter::Used => code.is_used,
            CodeUsageFilter::Unused => !code.is_used,
        }
    }
}

impl fmt::Display for CodeUsageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeUsageFilter::All => write!(f, "all"),
            CodeUsageFilter::Used => write!(f, "used"),
            CodeUsageFilter::Unused => write!(f, "unused"),
        }
    }
}

impl FromStr for CodeUsageFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(CodeUsageFilter::All),
            "used" => Ok(CodeUsageFilter::Used),
            "unused" => Ok(CodeUsageFilter::Unused),
            _ => Err(Error::invalid("usage", "Invalid usage filter")),
        }
    }
}

/// Filters for the admin pool listing.
#[derive(Debug, Clone, Default)]
pub struct PoolFilter {
    pub name: Option<String>,
    pub material: Option<Uuid>,
    pub course: Option<Uuid>,
    pub expiration_from: Option<DateTime<Utc>>,
    pub expiration_to: Option<DateTime<Utc>>,
}

impl PoolFilter {
    pub fn matches(&self, pool: &CodePool) -> bool {
        if let Some(name) = &self.name {
            if !pool.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(material) = self.material {
            let e = &pool.entitlements;
            if !e.materials_with_questions.contains(&material)
                && !e.materials_with_lectures.contains(&material)
            {
                return false;
            }
        }
        if let Some(course) = self.course {
            if !pool.entitlements.courses.contains(&course) {
                return false;
            }
        }
        if let Some(from) = self.expiration_from {
            if pool.expiration < from {
                return false;
            }
        }
        if let Some(to) = self.expiration_to {
            if pool.expiration > to {
                return false;
            }
        }
        true
    }
}

/// One page of a pool's codes, with totals for the applied usage filter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCodes {
    pub pool_id: Uuid,
    pub name: String,
    pub expiration: DateTime<Utc>,
    pub total_codes: usize,
    pub total_used: usize,
    pub codes: Vec<Code>,
    pub filter: CodeUsageFilter,
}

/// Result of a guarded, cascading pool delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDeletion {
    pub codes_removed: u64,
    pub redemptions_removed: u64,
}

/// Trims and upper-cases a submitted code, rejecting anything that is not
/// exactly [`CODE_LENGTH`] ASCII alphanumerics.
pub fn normalize_code(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid("code", "code is required"));
    }
    if trimmed.chars().count() != CODE_LENGTH || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::invalid(
            "code",
            format!("code must be {} characters", CODE_LENGTH),
        ));
    }
    Ok(trimmed.to_ascii_uppercase())
}
