use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{
    Admin, Code, CodeLookup, CodePool, College, Course, CourseFile, Lecture, Material, Page,
    PageRequest, PoolDeletion, PoolFilter, PoolSummary, Question, Redemption, Student, University,
    Video,
};

#[async_trait]
pub trait CodePoolRepository: Send + Sync {
    /// Persists the pool and all of its codes in one write. A code value that
    /// already exists anywhere fails with `Conflict(CodeCollision)`.
    async fn create_pool(&self, pool: &CodePool, code_values: &[String]) -> Result<(), Error>;
    async fn get_pool(&self, pool_id: Uuid) -> Result<Option<CodePool>, Error>;
    /// Newest first.
    async fn list_pools(&self, filter: &PoolFilter, page: PageRequest) -> Result<Page<PoolSummary>, Error>;
    /// Codes of one pool in a stable order.
    async fn list_codes(&self, pool_id: Uuid) -> Result<Vec<Code>, Error>;
    async fn get_code(&self, code_value: &str) -> Result<Option<Code>, Error>;

    /// Deletes a pool, its codes and every student's redemption of it, all or
    /// nothing. Refuses with `Conflict(PoolHasUsedCodes)` while any code is
    /// used and with `NotFound` when the pool is gone.
    async fn delete_pool_cascade(&self, pool_id: Uuid) -> Result<PoolDeletion, Error>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_student(&self, student: &Student) -> Result<(), Error>;
    async fn get_student(&self, student_id: Uuid) -> Result<Option<Student>, Error>;
    async fn create_admin(&self, admin: &Admin) -> Result<(), Error>;
    async fn get_admin(&self, admin_id: Uuid) -> Result<Option<Admin>, Error>;
    /// Oldest first.
    async fn list_redemptions(&self, student_id: Uuid) -> Result<Vec<Redemption>, Error>;
}

/// Read access to the catalog that paid content hangs off.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// The subset of `ids` that exist as materials.
    async fn existing_material_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, Error>;
    /// The subset of `ids` that exist as courses.
    async fn existing_course_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, Error>;

    async fn get_university(&self, university_id: Uuid) -> Result<Option<University>, Error>;
    async fn get_college(&self, college_id: Uuid) -> Result<Option<College>, Error>;
    async fn get_material(&self, material_id: Uuid) -> Result<Option<Material>, Error>;
    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>, Error>;
    async fn get_video(&self, video_id: Uuid) -> Result<Option<Video>, Error>;

    /// By id, ordered by name.
    async fn list_universities(&self, ids: &[Uuid]) -> Result<Vec<University>, Error>;
    /// By id, ordered by name.
    async fn list_colleges(&self, ids: &[Uuid]) -> Result<Vec<College>, Error>;
    /// By id, ordered by name.
    async fn list_materials(&self, ids: &[Uuid]) -> Result<Vec<Material>, Error>;

    async fn list_courses_for_material(&self, material_id: Uuid) -> Result<Vec<Course>, Error>;
    /// Ordered by lecture number.
    async fn list_lectures(&self, material_id: Uuid) -> Result<Vec<Lecture>, Error>;
    /// Ordered by file number.
    async fn list_course_files(&self, course_id: Uuid) -> Result<Vec<CourseFile>, Error>;
    async fn list_videos(&self, course_id: Uuid) -> Result<Vec<Video>, Error>;
    async fn list_questions(&self, material_id: Uuid) -> Result<Vec<Question>, Error>;
}

/// Opens units of work for the redemption transaction.
#[async_trait]
pub trait RedemptionStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn RedemptionUnit>, Error>;
}

/// One open redemption transaction.
///
/// Reads taken through a unit hold their locks until `commit` or `rollback`,
/// so a concurrent unit touching the same code or the same student waits.
/// Dropping a unit without committing discards every write made through it.
#[async_trait]
pub trait RedemptionUnit: Send {
    /// Finds and locks the code plus its owning pool.
    async fn lock_code(&mut self, code_value: &str) -> Result<Option<CodeLookup>, Error>;

    /// Locks the student and returns their redemptions, or `None` when the
    /// student does not exist.
    async fn lock_student_redemptions(&mut self, student_id: Uuid) -> Result<Option<Vec<Redemption>>, Error>;

    /// Sets `is_used` only if it is still false. Returns whether a row changed.
    async fn mark_code_used(&mut self, code_value: &str, used_at: DateTime<Utc>) -> Result<bool, Error>;

    async fn append_redemption(&mut self, redemption: &Redemption) -> Result<(), Error>;

    async fn commit(self: Box<Self>) -> Result<(), Error>;
    async fn rollback(self: Box<Self>) -> Result<(), Error>;
}
