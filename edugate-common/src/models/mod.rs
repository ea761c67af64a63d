// File: edugate-common/src/models/mod.rs
pub mod auth;
pub mod catalog;
pub mod code_pool;
pub mod entitlement;
pub mod page;
pub mod student;

pub use auth::{Claims, Role};
pub use catalog::{
    Choice, College, Course, CourseFile, CourseFileListing, FileAsset, Lecture, LectureListing,
    Material, Question, University, Video,
};
pub use code_pool::{
    normalize_code, Code, CodeLookup, CodePool, CodeUsageFilter, NewCodePool, PoolCodes, PoolCreated,
    PoolDeletion, PoolEntitlements, PoolFilter, PoolSummary, CODE_LENGTH, MAX_CODES_PER_POOL,
};
pub use entitlement::{AccessDecision, DenyReason, EntitlementSet, Resource};
pub use page::{Page, PageRequest};
pub use student::{
    Admin, RedeemedPoolInfo, Redemption, RedemptionHistoryEntry, RedemptionReceipt, Student,
};
