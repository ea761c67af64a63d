// File: src/services/access_gate.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use edugate_common::models::{
    AccessDecision, College, Course, CourseFile, CourseFileListing, EntitlementSet, Lecture,
    LectureListing, Material, Page, PageRequest, Question, Resource, University, Video,
};
use edugate_common::traits::CatalogRepository;

use crate::Error;
use crate::services::entitlement_service::EntitlementService;

const NO_ACCESS: &str = "You do not have access to this content";

/// Authorization in front of every paid-content read.
///
/// Most resources are all-or-nothing and answer `Forbidden` when denied.
/// Lectures and course files instead degrade to a teaser view.
pub struct AccessGate {
    entitlements: Arc<EntitlementService>,
    catalog: Arc<dyn CatalogRepository + Send + Sync>,
}

impl AccessGate {
    pub fn new(entitlements: Arc<EntitlementService>, catalog: Arc<dyn CatalogRepository + Send + Sync>) -> Self {
        Self {
            entitlements,
            catalog,
        }
    }

    pub fn entitlements(&self) -> &EntitlementService {
        &self.entitlements
    }

    /// Decides whether `student_id` may read `resource`. Unknown resources
    /// are `NotFound`, never a denial.
    pub async fn require_access(&self, student_id: Uuid, resource: Resource) -> Result<AccessDecision, Error> {
        let set = self.entitlements.resolve_access(student_id).await?;
        self.decide(&set, resource).await
    }

    async fn decide(&self, set: &EntitlementSet, resource: Resource) -> Result<AccessDecision, Error> {
        let allowed = match resource {
            Resource::Material(id) => {
                self.material(id).await?;
                set.has_material(id)
            }
            Resource::MaterialLectures(id) => {
                self.material(id).await?;
                set.can_view_lectures(id)
            }
            Resource::MaterialQuestions(id) => {
                self.material(id).await?;
                set.can_view_questions(id)
            }
            Resource::Course(id) | Resource::CourseFiles(id) => {
                let course = self.course(id).await?;
                set.can_view_course(&course)
            }
            Resource::Video(id) => {
                let video = self
                    .catalog
                    .get_video(id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("video {id}")))?;
                let course = self.course(video.course_id).await?;
                set.can_view_course(&course)
            }
        };
        Ok(AccessDecision::from_bool(allowed))
    }

    async fn material(&self, id: Uuid) -> Result<Material, Error> {
        self.catalog
            .get_material(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("material {id}")))
    }

    async fn course(&self, id: Uuid) -> Result<Course, Error> {
        self.catalog
            .get_course(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("course {id}")))
    }

    async fn accessible_materials(&self, set: &EntitlementSet) -> Result<Vec<Material>, Error> {
        let ids: Vec<Uuid> = set.materials().into_iter().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.catalog.list_materials(&ids).await
    }

    async fn accessible_colleges(&self, set: &EntitlementSet) -> Result<Vec<College>, Error> {
        let materials = self.accessible_materials(set).await?;
        let ids: Vec<Uuid> = materials
            .iter()
            .map(|m| m.college_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.catalog.list_colleges(&ids).await
    }

    /// Universities that hold at least one material the student unlocked.
    pub async fn universities(&self, student_id: Uuid, page: PageRequest) -> Result<Page<University>, Error> {
        let set = self.entitlements.resolve_access(student_id).await?;
        let colleges = self.accessible_colleges(&set).await?;
        let ids: Vec<Uuid> = colleges
            .iter()
            .map(|c| c.university_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(Page::from_vec(Vec::new(), page));
        }
        let universities = self.catalog.list_universities(&ids).await?;
        Ok(Page::from_vec(universities, page))
    }

    pub async fn colleges(
        &self,
        student_id: Uuid,
        university_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<College>, Error> {
        if let Some(id) = university_id {
            if self.catalog.get_university(id).await?.is_none() {
                return Err(Error::NotFound(format!("university {id}")));
            }
        }
        let set = self.entitlements.resolve_access(student_id).await?;
        let colleges = self
            .accessible_colleges(&set)
            .await?
            .into_iter()
            .filter(|c| university_id.is_none_or(|u| c.university_id == u))
            .collect();
        Ok(Page::from_vec(colleges, page))
    }

    pub async fn materials(
        &self,
        student_id: Uuid,
        college_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<Material>, Error> {
        if let Some(id) = college_id {
            if self.catalog.get_college(id).await?.is_none() {
                return Err(Error::NotFound(format!("college {id}")));
            }
        }
        let set = self.entitlements.resolve_access(student_id).await?;
        let materials = self
            .accessible_materials(&set)
            .await?
            .into_iter()
            .filter(|m| college_id.is_none_or(|c| m.college_id == c))
            .collect();
        Ok(Page::from_vec(materials, page))
    }

    /// Courses of a material the student can open, directly or through the
    /// material itself.
    pub async fn courses(&self, student_id: Uuid, material_id: Uuid, page: PageRequest) -> Result<Page<Course>, Error> {
        self.material(material_id).await?;
        let set = self.entitlements.resolve_access(student_id).await?;
        let courses = self
            .catalog
            .list_courses_for_material(material_id)
            .await?
            .into_iter()
            .filter(|c| set.can_view_course(c))
            .collect();
        Ok(Page::from_vec(courses, page))
    }

    pub async fn videos(&self, student_id: Uuid, course_id: Uuid, page: PageRequest) -> Result<Page<Video>, Error> {
        let decision = self.require_access(student_id, Resource::Course(course_id)).await?;
        if !decision.is_allowed() {
            return Err(Error::Forbidden(NO_ACCESS.to_string()));
        }
        let videos = self.catalog.list_videos(course_id).await?;
        Ok(Page::from_vec(videos, page))
    }

    pub async fn video(&self, student_id: Uuid, video_id: Uuid) -> Result<Video, Error> {
        let decision = self.require_access(student_id, Resource::Video(video_id)).await?;
        if !decision.is_allowed() {
            return Err(Error::Forbidden(NO_ACCESS.to_string()));
        }
        self.catalog
            .get_video(video_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("video {video_id}")))
    }

    pub async fn questions(
        &self,
        student_id: Uuid,
        material_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Question>, Error> {
        let decision = self
            .require_access(student_id, Resource::MaterialQuestions(material_id))
            .await?;
        if !decision.is_allowed() {
            return Err(Error::Forbidden(NO_ACCESS.to_string()));
        }
        let questions = self.catalog.list_questions(material_id).await?;
        Ok(Page::from_vec(questions, page))
    }

    /// Without a lecture grant the first lecture stays whole and every later
    /// one loses its download link.
    pub async fn lectures(&self, student_id: Uuid, material_id: Uuid) -> Result<LectureListing, Error> {
        let decision = self
            .require_access(student_id, Resource::MaterialLectures(material_id))
            .await?;
        let lectures = self.catalog.list_lectures(material_id).await?;

        if decision.is_allowed() {
            return Ok(LectureListing {
                lectures,
                has_full_access: true,
            });
        }

        let lectures = lectures
            .into_iter()
            .enumerate()
            .map(|(i, lecture)| if i == 0 { lecture } else { redact_lecture(lecture) })
            .collect();
        Ok(LectureListing {
            lectures,
            has_full_access: false,
        })
    }

    /// File names are always listed; access URLs only with course access.
    pub async fn course_files(&self, student_id: Uuid, course_id: Uuid) -> Result<CourseFileListing, Error> {
        let decision = self
            .require_access(student_id, Resource::CourseFiles(course_id))
            .await?;
        let files = self.catalog.list_course_files(course_id).await?;

        if decision.is_allowed() {
            return Ok(CourseFileListing {
                files,
                has_full_access: true,
            });
        }

        Ok(CourseFileListing {
            files: files.into_iter().map(redact_course_file).collect(),
            has_full_access: false,
        })
    }
}

fn redact_lecture(lecture: Lecture) -> Lecture {
    Lecture {
        file: lecture.file.as_ref().map(|f| f.redacted()),
        ..lecture
    }
}

fn redact_course_file(file: CourseFile) -> CourseFile {
    CourseFile {
        file: file.file.as_ref().map(|f| f.redacted()),
        ..file
    }
}
