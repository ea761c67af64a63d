// File: edugate-core/src/test_utils/memory.rs
//
// In-memory stand-in for the Postgres stores. One mutex guards all state, so
// a redemption unit that holds it runs serializably against every other
// unit. Unit writes are staged and only applied on commit.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use edugate_common::error::{ConflictCause, Error};
use edugate_common::models::{
    Admin, Code, CodeLookup, CodePool, College, Course, CourseFile, Lecture, Material, Page,
    PageRequest, PoolDeletion, PoolFilter, PoolSummary, Question, Redemption, Student, University,
    Video,
};
use edugate_common::traits::{
    AccountRepository, CatalogRepository, CodePoolRepository, RedemptionStore, RedemptionUnit,
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub pools: HashMap<Uuid, CodePool>,
    pub codes: BTreeMap<String, Code>,
    pub students: HashMap<Uuid, Student>,
    pub admins: HashMap<Uuid, Admin>,
    pub redemptions: Vec<Redemption>,
    pub universities: HashMap<Uuid, University>,
    pub colleges: HashMap<Uuid, College>,
    pub materials: HashMap<Uuid, Material>,
    pub courses: HashMap<Uuid, Course>,
    pub lectures: Vec<Lecture>,
    pub course_files: Vec<CourseFile>,
    pub videos: Vec<Video>,
    pub questions: Vec<Question>,
}

impl MemoryState {
    fn code_used(&self, code_value: &str) -> bool {
        self.codes.get(code_value).map(|c| c.is_used).unwrap_or(false)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_append: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `append_redemption` fail after the code was already
    /// marked used inside the same unit.
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn add_student(&self, student: Student) {
        self.state.lock().await.students.insert(student.student_id, student);
    }

    pub async fn add_admin(&self, admin: Admin) {
        self.state.lock().await.admins.insert(admin.admin_id, admin);
    }

    pub async fn add_university(&self, university: University) {
        self.state.lock().await.universities.insert(university.university_id, university);
    }

    pub async fn add_college(&self, college: College) {
        self.state.lock().await.colleges.insert(college.college_id, college);
    }

    pub async fn add_material(&self, material: Material) {
        self.state.lock().await.materials.insert(material.material_id, material);
    }

    pub async fn add_course(&self, course: Course) {
        self.state.lock().await.courses.insert(course.course_id, course);
    }

    pub async fn add_lecture(&self, lecture: Lecture) {
        self.state.lock().await.lectures.push(lecture);
    }

    pub async fn add_course_file(&self, file: CourseFile) {
        self.state.lock().await.course_files.push(file);
    }

    pub async fn add_video(&self, video: Video) {
        self.state.lock().await.videos.push(video);
    }

    pub async fn add_question(&self, question: Question) {
        self.state.lock().await.questions.push(question);
    }

    /// Codes of a pool in value order.
    pub async fn code_values(&self, pool_id: Uuid) -> Vec<String> {
        self.state
            .lock()
            .await
            .codes
            .values()
            .filter(|c| c.pool_id == pool_id)
            .map(|c| c.code_value.clone())
            .collect()
    }

    /// Administrative revocation: flips a code back to unused without
    /// touching redemptions.
    pub async fn revoke_code(&self, code_value: &str) {
        if let Some(code) = self.state.lock().await.codes.get_mut(code_value) {
            code.is_used = false;
            code.used_at = None;
        }
    }

    pub async fn set_pool_expiration(&self, pool_id: Uuid, expiration: DateTime<Utc>) {
        if let Some(pool) = self.state.lock().await.pools.get_mut(&pool_id) {
            pool.expiration = expiration;
        }
    }
}

fn sorted_by_name<T: Clone>(items: impl Iterator<Item = T>, name: impl Fn(&T) -> String) -> Vec<T> {
    let mut v: Vec<T> = items.collect();
    v.sort_by_key(|item| name(item));
    v
}

#[async_trait]
impl CodePoolRepository for MemoryStore {
    async fn create_pool(&self, pool: &CodePool, code_values: &[String]) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if code_values.iter().any(|v| state.codes.contains_key(v)) {
            return Err(Error::Conflict(ConflictCause::CodeCollision));
        }
        state.pools.insert(pool.pool_id, pool.clone());
        for value in code_values {
            state.codes.insert(
                value.clone(),
                Code {
                    code_value: value.clone(),
                    pool_id: pool.pool_id,
                    is_used: false,
                    used_at: None,
                },
            );
        }
        Ok(())
    }

    async fn get_pool(&self, pool_id: Uuid) -> Result<Option<CodePool>, Error> {
        Ok(self.state.lock().await.pools.get(&pool_id).cloned())
    }

    async fn list_pools(&self, filter: &PoolFilter, page: PageRequest) -> Result<Page<PoolSummary>, Error> {
        let state = self.state.lock().await;
        let mut pools: Vec<&CodePool> = state.pools.values().filter(|p| filter.matches(p)).collect();
        pools.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.pool_id.cmp(&b.pool_id)));

        let summaries = pools
            .into_iter()
            .map(|p| {
                let codes: Vec<&Code> = state.codes.values().filter(|c| c.pool_id == p.pool_id).collect();
                PoolSummary {
                    pool: p.clone(),
                    total_codes: codes.len() as i64,
                    used_codes: codes.iter().filter(|c| c.is_used).count() as i64,
                }
            })
            .collect();
        Ok(Page::from_vec(summaries, page))
    }

    async fn list_codes(&self, pool_id: Uuid) -> Result<Vec<Code>, Error> {
        Ok(self
            .state
            .lock()
            .await
            .codes
            .values()
            .filter(|c| c.pool_id == pool_id)
            .cloned()
            .collect())
    }

    async fn get_code(&self, code_value: &str) -> Result<Option<Code>, Error> {
        Ok(self.state.lock().await.codes.get(code_value).cloned())
    }

    async fn delete_pool_cascade(&self, pool_id: Uuid) -> Result<PoolDeletion, Error> {
        let mut state = self.state.lock().await;
        if !state.pools.contains_key(&pool_id) {
            return Err(Error::NotFound(format!("codes group {pool_id}")));
        }
        if state.codes.values().any(|c| c.pool_id == pool_id && c.is_used) {
            return Err(Error::Conflict(ConflictCause::PoolHasUsedCodes));
        }

        let before = state.redemptions.len();
        state.redemptions.retain(|r| r.pool_id != pool_id);
        let redemptions_removed = (before - state.redemptions.len()) as u64;

        let before = state.codes.len();
        state.codes.retain(|_, c| c.pool_id != pool_id);
        let codes_removed = (before - state.codes.len()) as u64;

        state.pools.remove(&pool_id);
        Ok(PoolDeletion {
            codes_removed,
            redemptions_removed,
        })
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create_student(&self, student: &Student) -> Result<(), Error> {
        self.add_student(student.clone()).await;
        Ok(())
    }

    async fn get_student(&self, student_id: Uuid) -> Result<Option<Student>, Error> {
        Ok(self.state.lock().await.students.get(&student_id).cloned())
    }

    async fn create_admin(&self, admin: &Admin) -> Result<(), Error> {
        self.add_admin(admin.clone()).await;
        Ok(())
    }

    async fn get_admin(&self, admin_id: Uuid) -> Result<Option<Admin>, Error> {
        Ok(self.state.lock().await.admins.get(&admin_id).cloned())
    }

    async fn list_redemptions(&self, student_id: Uuid) -> Result<Vec<Redemption>, Error> {
        Ok(self
            .state
            .lock()
            .await
            .redemptions
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn existing_material_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, Error> {
        let state = self.state.lock().await;
        Ok(ids.iter().copied().filter(|id| state.materials.contains_key(id)).collect())
    }

    async fn existing_course_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, Error> {
        let state = self.state.lock().await;
        Ok(ids.iter().copied().filter(|id| state.courses.contains_key(id)).collect())
    }

    async fn get_university(&self, university_id: Uuid) -> Result<Option<University>, Error> {
        Ok(self.state.lock().await.universities.get(&university_id).cloned())
    }

    async fn get_college(&self, college_id: Uuid) -> Result<Option<College>, Error> {
        Ok(self.state.lock().await.colleges.get(&college_id).cloned())
    }

    async fn get_material(&self, material_id: Uuid) -> Result<Option<Material>, Error> {
        Ok(self.state.lock().await.materials.get(&material_id).cloned())
    }

    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>, Error> {
        Ok(self.state.lock().await.courses.get(&course_id).cloned())
    }

    async fn get_video(&self, video_id: Uuid) -> Result<Option<Video>, Error> {
        Ok(self
            .state
            .lock()
            .await
            .videos
            .iter()
            .find(|v| v.video_id == video_id)
            .cloned())
    }

    async fn list_universities(&self, ids: &[Uuid]) -> Result<Vec<University>, Error> {
        let state = self.state.lock().await;
        Ok(sorted_by_name(
            ids.iter().filter_map(|id| state.universities.get(id).cloned()),
            |u| u.name.clone(),
        ))
    }

    async fn list_colleges(&self, ids: &[Uuid]) -> Result<Vec<College>, Error> {
        let state = self.state.lock().await;
        Ok(sorted_by_name(
            ids.iter().filter_map(|id| state.colleges.get(id).cloned()),
            |c| c.name.clone(),
        ))
    }

    async fn list_materials(&self, ids: &[Uuid]) -> Result<Vec<Material>, Error> {
        let state = self.state.lock().await;
        Ok(sorted_by_name(
            ids.iter().filter_map(|id| state.materials.get(id).cloned()),
            |m| m.name.clone(),
        ))
    }

    async fn list_courses_for_material(&self, material_id: Uuid) -> Result<Vec<Course>, Error> {
        let state = self.state.lock().await;
        Ok(sorted_by_name(
            state
                .courses
                .values()
                .filter(|c| c.material_id == Some(material_id))
                .cloned(),
            |c| c.name.clone(),
        ))
    }

    async fn list_lectures(&self, material_id: Uuid) -> Result<Vec<Lecture>, Error> {
        let state = self.state.lock().await;
        let mut lectures: Vec<Lecture> = state
            .lectures
            .iter()
            .filter(|l| l.material_id == material_id)
            .cloned()
            .collect();
        lectures.sort_by_key(|l| l.num);
        Ok(lectures)
    }

    async fn list_course_files(&self, course_id: Uuid) -> Result<Vec<CourseFile>, Error> {
        let state = self.state.lock().await;
        let mut files: Vec<CourseFile> = state
            .course_files
            .iter()
            .filter(|f| f.course_id == course_id)
            .cloned()
            .collect();
        files.sort_by_key(|f| f.num);
        Ok(files)
    }

    async fn list_videos(&self, course_id: Uuid) -> Result<Vec<Video>, Error> {
        let state = self.state.lock().await;
        Ok(sorted_by_name(
            state.videos.iter().filter(|v| v.course_id == course_id).cloned(),
            |v| v.name.clone(),
        ))
    }

    async fn list_questions(&self, material_id: Uuid) -> Result<Vec<Question>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .questions
            .iter()
            .filter(|q| q.material_id == material_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RedemptionStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn RedemptionUnit>, Error> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryUnit {
            guard,
            used: Vec::new(),
            appended: Vec::new(),
            fail_next_append: self.fail_next_append.clone(),
        }))
    }
}

/// Holds the store lock for its whole life. Writes sit in `used` and
/// `appended` until commit.
pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    used: Vec<(String, DateTime<Utc>)>,
    appended: Vec<Redemption>,
    fail_next_append: Arc<AtomicBool>,
}

impl MemoryUnit {
    fn staged_used(&self, code_value: &str) -> bool {
        self.used.iter().any(|(v, _)| v == code_value)
    }
}

#[async_trait]
impl RedemptionUnit for MemoryUnit {
    async fn lock_code(&mut self, code_value: &str) -> Result<Option<CodeLookup>, Error> {
        let Some(code) = self.guard.codes.get(code_value).cloned() else {
            return Ok(None);
        };
        let Some(pool) = self.guard.pools.get(&code.pool_id).cloned() else {
            return Ok(None);
        };
        let mut code = code;
        if let Some((_, at)) = self.used.iter().find(|(v, _)| v == code_value) {
            code.is_used = true;
            code.used_at = Some(*at);
        }
        Ok(Some(CodeLookup { code, pool }))
    }

    async fn lock_student_redemptions(&mut self, student_id: Uuid) -> Result<Option<Vec<Redemption>>, Error> {
        if !self.guard.students.contains_key(&student_id) {
            return Ok(None);
        }
        Ok(Some(
            self.guard
                .redemptions
                .iter()
                .chain(self.appended.iter())
                .filter(|r| r.student_id == student_id)
                .cloned()
                .collect(),
        ))
    }

    async fn mark_code_used(&mut self, code_value: &str, used_at: DateTime<Utc>) -> Result<bool, Error> {
        if !self.guard.codes.contains_key(code_value)
            || self.guard.code_used(code_value)
            || self.staged_used(code_value)
        {
            return Ok(false);
        }
        self.used.push((code_value.to_string(), used_at));
        Ok(true)
    }

    async fn append_redemption(&mut self, redemption: &Redemption) -> Result<(), Error> {
        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(Error::Conflict(ConflictCause::WriteConflict));
        }
        let mut existing = self.guard.redemptions.iter().chain(self.appended.iter());
        if existing.any(|r| r.student_id == redemption.student_id && r.pool_id == redemption.pool_id) {
            return Err(Error::DuplicateRedemptionInPool);
        }
        if self
            .guard
            .redemptions
            .iter()
            .chain(self.appended.iter())
            .any(|r| r.code_value == redemption.code_value)
        {
            return Err(Error::CodeAlreadyUsed);
        }
        self.appended.push(redemption.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let MemoryUnit {
            mut guard,
            used,
            appended,
            ..
        } = *self;
        for (value, at) in used {
            if let Some(code) = guard.codes.get_mut(&value) {
                code.is_used = true;
                code.used_at = Some(at);
            }
        }
        guard.redemptions.extend(appended);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}
