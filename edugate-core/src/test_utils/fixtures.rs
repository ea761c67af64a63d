// File: edugate-core/src/test_utils/fixtures.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use edugate_common::models::{
    Admin, Choice, College, Course, CourseFile, FileAsset, Lecture, Material, NewCodePool,
    PoolEntitlements, Question, Student, University, Video,
};

use crate::auth::TokenCodec;
use crate::http::AppState;
use crate::services::{AccessGate, CodePoolService, EntitlementService, RedemptionService};
use crate::test_utils::memory::MemoryStore;

pub const TEST_TOKEN_KEY: [u8; 32] = [42u8; 32];

/// Every service wired to one in-memory store.
pub struct Services {
    pub store: MemoryStore,
    pub codes: Arc<CodePoolService>,
    pub redemptions: Arc<RedemptionService>,
    pub entitlements: Arc<EntitlementService>,
    pub gate: Arc<AccessGate>,
}

impl Services {
    pub fn new(store: MemoryStore) -> Self {
        let shared = Arc::new(store.clone());
        let codes = Arc::new(CodePoolService::new(shared.clone(), shared.clone()));
        let redemptions = Arc::new(RedemptionService::new(shared.clone(), shared.clone(), shared.clone()));
        let entitlements = Arc::new(EntitlementService::new(shared.clone(), shared.clone()));
        let gate = Arc::new(AccessGate::new(entitlements.clone(), shared));
        Self {
            store,
            codes,
            redemptions,
            entitlements,
            gate,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            codes: self.codes.clone(),
            redemptions: self.redemptions.clone(),
            gate: self.gate.clone(),
            accounts: Arc::new(self.store.clone()),
            tokens: test_token_codec(),
        }
    }
}

pub fn test_token_codec() -> TokenCodec {
    // 32-byte constant key cannot fail.
    TokenCodec::new(&TEST_TOKEN_KEY).unwrap_or_else(|e| panic!("test key rejected: {e}"))
}

pub fn student(first_name: &str) -> Student {
    Student {
        student_id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        last_name: "Test".to_string(),
        phone: format!("+2010{}", &Uuid::new_v4().simple().to_string()[..8]),
        university_id: None,
        college_id: None,
        year: 1,
        created_at: Utc::now(),
    }
}

pub fn admin(username: &str) -> Admin {
    Admin {
        admin_id: Uuid::new_v4(),
        username: username.to_string(),
        created_at: Utc::now(),
    }
}

/// A pool request entitling the given materials to both lectures and questions.
pub fn pool_request(name: &str, code_count: u32, expiration: DateTime<Utc>, materials: &[Uuid]) -> NewCodePool {
    NewCodePool {
        name: name.to_string(),
        entitlements: PoolEntitlements {
            materials_with_questions: materials.to_vec(),
            materials_with_lectures: materials.to_vec(),
            courses: Vec::new(),
        },
        code_count,
        expiration,
    }
}

pub fn in_days(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

/// A small catalog: one university, one college, two materials (M1, M2),
/// a course under each material, plus lectures, files, a video and a question.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub university: University,
    pub college: College,
    pub m1: Material,
    pub m2: Material,
    pub course_m1: Course,
    pub course_m2: Course,
    pub lectures_m1: Vec<Lecture>,
    pub files_course_m1: Vec<CourseFile>,
    pub video_m1: Video,
    pub question_m1: Question,
}

fn asset(name: &str) -> Option<FileAsset> {
    Some(FileAsset {
        filename: name.to_string(),
        access_url: Some(format!("https://cdn.example.test/{name}")),
    })
}

pub async fn seed_catalog(store: &MemoryStore) -> Catalog {
    let university = University {
        university_id: Uuid::new_v4(),
        name: "Cairo University".into(),
        icon_url: None,
    };
    let college = College {
        college_id: Uuid::new_v4(),
        university_id: university.university_id,
        name: "Engineering".into(),
        icon_url: None,
        num_of_years: 5,
    };
    let m1 = Material {
        material_id: Uuid::new_v4(),
        college_id: college.college_id,
        name: "Algebra".into(),
        year: 1,
        color: Some("#3366ff".into()),
    };
    let m2 = Material {
        material_id: Uuid::new_v4(),
        college_id: college.college_id,
        name: "Mechanics".into(),
        year: 1,
        color: None,
    };
    let course_m1 = Course {
        course_id: Uuid::new_v4(),
        material_id: Some(m1.material_id),
        name: "Linear Equations".into(),
        description: None,
    };
    let course_m2 = Course {
        course_id: Uuid::new_v4(),
        material_id: Some(m2.material_id),
        name: "Statics".into(),
        description: None,
    };
    let lectures_m1: Vec<Lecture> = (1..=3)
        .map(|num| Lecture {
            lecture_id: Uuid::new_v4(),
            material_id: m1.material_id,
            num,
            file: asset(&format!("algebra-{num}.pdf")),
        })
        .collect();
    let files_course_m1: Vec<CourseFile> = (1..=2)
        .map(|num| CourseFile {
            course_file_id: Uuid::new_v4(),
            course_id: course_m1.course_id,
            num,
            file: asset(&format!("linear-{num}.pdf")),
        })
        .collect();
    let video_m1 = Video {
        video_id: Uuid::new_v4(),
        course_id: course_m1.course_id,
        name: "Gaussian elimination".into(),
        url: Some("https://video.example.test/gauss".into()),
    };
    let question_m1 = Question {
        question_id: Uuid::new_v4(),
        material_id: m1.material_id,
        text: "2x = 4, x = ?".into(),
        is_multiple_choice: true,
        choices: Json(vec![
            Choice {
                text: "2".into(),
                is_correct: true,
            },
            Choice {
                text: "4".into(),
                is_correct: false,
            },
        ]),
        information: None,
    };

    store.add_university(university.clone()).await;
    store.add_college(college.clone()).await;
    store.add_material(m1.clone()).await;
    store.add_material(m2.clone()).await;
    store.add_course(course_m1.clone()).await;
    store.add_course(course_m2.clone()).await;
    for lecture in &lectures_m1 {
        store.add_lecture(lecture.clone()).await;
    }
    for file in &files_course_m1 {
        store.add_course_file(file.clone()).await;
    }
    store.add_video(video_m1.clone()).await;
    store.add_question(question_m1.clone()).await;

    Catalog {
        university,
        college,
        m1,
        m2,
        course_m1,
        course_m2,
        lectures_m1,
        files_course_m1,
        video_m1,
        question_m1,
    }
}
