// File: edugate-core/src/repositories/postgres/accounts.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use edugate_common::error::Error;
use edugate_common::models::{Admin, Redemption, Student};
use edugate_common::traits::AccountRepository;

use super::map_write_error;

pub struct PostgresAccountRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresAccountRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create_student(&self, student: &Student) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO students (
                student_id,
                first_name,
                last_name,
                phone,
                university_id,
                college_id,
                year,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
            .bind(student.student_id)
            .bind(&student.first_name)
            .bind(&student.last_name)
            .bind(&student.phone)
            .bind(student.university_id)
            .bind(student.college_id)
            .bind(student.year)
            .bind(student.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn get_student(&self, student_id: Uuid) -> Result<Option<Student>, Error> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT student_id,
                   first_name,
                   last_name,
                   phone,
                   university_id,
                   college_id,
                   year,
                   created_at
            FROM students
            WHERE student_id = $1
            "#,
        )
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    async fn create_admin(&self, admin: &Admin) -> Result<(), Error> {
        sqlx::query("INSERT INTO admins (admin_id, username, created_at) VALUES ($1, $2, $3)")
            .bind(admin.admin_id)
            .bind(&admin.username)
            .bind(admin.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn get_admin(&self, admin_id: Uuid) -> Result<Option<Admin>, Error> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT admin_id, username, created_at FROM admins WHERE admin_id = $1",
        )
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn list_redemptions(&self, student_id: Uuid) -> Result<Vec<Redemption>, Error> {
        let rows = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT redemption_id, student_id, pool_id, code_value, redeemed_at
            FROM student_redemptions
            WHERE student_id = $1
            ORDER BY redeemed_at
            "#,
        )
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
