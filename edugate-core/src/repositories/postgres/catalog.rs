// File: edugate-core/src/repositories/postgres/catalog.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use edugate_common::error::Error;
use edugate_common::models::{
    College, Course, CourseFile, FileAsset, Lecture, Material, Question, University, Video,
};
use edugate_common::traits::CatalogRepository;

pub struct PostgresCatalogRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCatalogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn file_from_row(r: &PgRow) -> Result<Option<FileAsset>, sqlx::Error> {
    let filename: Option<String> = r.try_get("filename")?;
    let access_url: Option<String> = r.try_get("access_url")?;
    Ok(filename.map(|filename| FileAsset { filename, access_url }))
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn existing_material_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, Error> {
        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT material_id FROM materials WHERE material_id = ANY($1)",
        )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(found)
    }

    async fn existing_course_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, Error> {
        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT course_id FROM courses WHERE course_id = ANY($1)",
        )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(found)
    }

    async fn get_university(&self, university_id: Uuid) -> Result<Option<University>, Error> {
        let row = sqlx::query_as::<_, University>(
            "SELECT university_id, name, icon_url FROM universities WHERE university_id = $1",
        )
            .bind(university_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_college(&self, college_id: Uuid) -> Result<Option<College>, Error> {
        let row = sqlx::query_as::<_, College>(
            r#"
            SELECT college_id, university_id, name, icon_url, num_of_years
            FROM colleges
            WHERE college_id = $1
            "#,
        )
            .bind(college_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_material(&self, material_id: Uuid) -> Result<Option<Material>, Error> {
        let row = sqlx::query_as::<_, Material>(
            "SELECT material_id, college_id, name, year, color FROM materials WHERE material_id = $1",
        )
            .bind(material_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>, Error> {
        let row = sqlx::query_as::<_, Course>(
            "SELECT course_id, material_id, name, description FROM courses WHERE course_id = $1",
        )
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_video(&self, video_id: Uuid) -> Result<Option<Video>, Error> {
        let row = sqlx::query_as::<_, Video>(
            "SELECT video_id, course_id, name, url FROM videos WHERE video_id = $1",
        )
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_universities(&self, ids: &[Uuid]) -> Result<Vec<University>, Error> {
        let rows = sqlx::query_as::<_, University>(
            r#"
            SELECT university_id, name, icon_url
            FROM universities
            WHERE university_id = ANY($1)
            ORDER BY name
            "#,
        )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_colleges(&self, ids: &[Uuid]) -> Result<Vec<College>, Error> {
        let rows = sqlx::query_as::<_, College>(
            r#"
            SELECT college_id, university_id, name, icon_url, num_of_years
            FROM colleges
            WHERE college_id = ANY($1)
            ORDER BY name
            "#,
        )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_materials(&self, ids: &[Uuid]) -> Result<Vec<Material>, Error> {
        let rows = sqlx::query_as::<_, Material>(
            r#"
            SELECT material_id, college_id, name, year, color
            FROM materials
            WHERE material_id = ANY($1)
            ORDER BY name
            "#,
        )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_courses_for_material(&self, material_id: Uuid) -> Result<Vec<Course>, Error> {
        let rows = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, material_id, name, description
            FROM courses
            WHERE material_id = $1
            ORDER BY name
            "#,
        )
            .bind(material_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_lectures(&self, material_id: Uuid) -> Result<Vec<Lecture>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT lecture_id, material_id, num, filename, access_url
            FROM lectures
            WHERE material_id = $1
            ORDER BY num, lecture_id
            "#,
        )
            .bind(material_id)
            .fetch_all(&self.pool)
            .await?;

        let mut lectures = Vec::with_capacity(rows.len());
        for r in rows {
            lectures.push(Lecture {
                lecture_id: r.try_get("lecture_id")?,
                material_id: r.try_get("material_id")?,
                num: r.try_get("num")?,
                file: file_from_row(&r)?,
            });
        }
        Ok(lectures)
    }

    async fn list_course_files(&self, course_id: Uuid) -> Result<Vec<CourseFile>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT course_file_id, course_id, num, filename, access_url
            FROM course_files
            WHERE course_id = $1
            ORDER BY num, course_file_id
            "#,
        )
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;

        let mut files = Vec::with_capacity(rows.len());
        for r in rows {
            files.push(CourseFile {
                course_file_id: r.try_get("course_file_id")?,
                course_id: r.try_get("course_id")?,
                num: r.try_get("num")?,
                file: file_from_row(&r)?,
            });
        }
        Ok(files)
    }

    async fn list_videos(&self, course_id: Uuid) -> Result<Vec<Video>, Error> {
        let rows = sqlx::query_as::<_, Video>(
            r#"
            SELECT video_id, course_id, name, url
            FROM videos
            WHERE course_id = $1
            ORDER BY name
            "#,
        )
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_questions(&self, material_id: Uuid) -> Result<Vec<Question>, Error> {
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT question_id, material_id, text, is_multiple_choice, choices, information
            FROM questions
            WHERE material_id = $1
            ORDER BY question_id
            "#,
        )
            .bind(material_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
