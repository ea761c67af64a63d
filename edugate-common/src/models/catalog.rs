// File: edugate-common/src/models/catalog.rs
//
// Read-side shapes of the educational catalog. Catalog CRUD lives elsewhere;
// this crate only needs enough of it to decide and shape paid-content reads.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct University {
    pub university_id: Uuid,
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct College {
    pub college_id: Uuid,
    pub university_id: Uuid,
    pub name: String,
    pub icon_url: Option<String>,
    pub num_of_years: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub material_id: Uuid,
    pub college_id: Uuid,
    pub name: String,
    pub year: i32,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub course_id: Uuid,
    pub material_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
}

/// A stored file. `access_url` is the part that gets withheld from
/// students without an entitlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAsset {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
}

impl FileAsset {
    /// Same file, download link removed.
    pub fn redacted(&self) -> Self {
        Self {
            filename: self.filename.clone(),
            access_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub lecture_id: Uuid,
    pub material_id: Uuid,
    pub num: i32,
    pub file: Option<FileAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFile {
    pub course_file_id: Uuid,
    pub course_id: Uuid,
    pub num: i32,
    pub file: Option<FileAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub video_id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: Uuid,
    pub material_id: Uuid,
    pub text: String,
    pub is_multiple_choice: bool,
    pub choices: Json<Vec<Choice>>,
    pub information: Option<String>,
}

/// Lectures of one material as a particular student may see them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureListing {
    pub lectures: Vec<Lecture>,
    pub has_full_access: bool,
}

/// Files of one course as a particular student may see them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFileListing {
    pub files: Vec<CourseFile>,
    pub has_full_access: bool,
}
