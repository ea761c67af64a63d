// File: edugate-core/src/repositories/postgres/redemption.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use edugate_common::error::Error;
use edugate_common::models::{Code, CodeLookup, Redemption};
use edugate_common::traits::{RedemptionStore, RedemptionUnit};

use super::code_pools::pool_from_row;
use super::map_write_error;

/// Runs each redemption inside one Postgres transaction.
pub struct PostgresRedemptionStore {
    pub pool: Pool<Postgres>,
}

impl PostgresRedemptionStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedemptionStore for PostgresRedemptionStore {
    async fn begin(&self) -> Result<Box<dyn RedemptionUnit>, Error> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresRedemptionUnit { tx }))
    }
}

/// An open transaction. Row locks taken here are held until commit or
/// rollback; dropping the unit rolls back.
pub struct PostgresRedemptionUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RedemptionUnit for PostgresRedemptionUnit {
    async fn lock_code(&mut self, code_value: &str) -> Result<Option<CodeLookup>, Error> {
        let row = sqlx::query(
            r#"
            SELECT c.code_value,
                   c.is_used,
                   c.used_at,
                   p.pool_id,
                   p.name,
                   p.expiration,
                   p.materials_with_questions,
                   p.materials_with_lectures,
                   p.courses,
                   p.created_at
            FROM codes c
            JOIN code_pools p ON p.pool_id = c.pool_id
            WHERE c.code_value = $1
            FOR UPDATE OF c
            FOR SHARE OF p
            "#,
        )
            .bind(code_value)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_write_error)?;

        let Some(r) = row else {
            return Ok(None);
        };
        let pool = pool_from_row(&r)?;
        let code = Code {
            code_value: r.try_get("code_value")?,
            pool_id: pool.pool_id,
            is_used: r.try_get("is_used")?,
            used_at: r.try_get::<Option<DateTime<Utc>>, _>("used_at")?,
        };
        Ok(Some(CodeLookup { code, pool }))
    }

    async fn lock_student_redemptions(&mut self, student_id: Uuid) -> Result<Option<Vec<Redemption>>, Error> {
        // Serializes concurrent redemptions by the same student, whatever code they use.
        let student = sqlx::query("SELECT student_id FROM students WHERE student_id = $1 FOR UPDATE")
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        if student.is_none() {
            return Ok(None);
        }

        let redemptions = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT redemption_id, student_id, pool_id, code_value, redeemed_at
            FROM student_redemptions
            WHERE student_id = $1
            ORDER BY redeemed_at
            "#,
        )
            .bind(student_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(Some(redemptions))
    }

    async fn mark_code_used(&mut self, code_value: &str, used_at: DateTime<Utc>) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE codes
            SET is_used = TRUE,
                used_at = $2
            WHERE code_value = $1
              AND NOT is_used
            "#,
        )
            .bind(code_value)
            .bind(used_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn append_redemption(&mut self, redemption: &Redemption) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO student_redemptions (
                redemption_id,
                student_id,
                pool_id,
                code_value,
                redeemed_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(redemption.redemption_id)
            .bind(redemption.student_id)
            .bind(redemption.pool_id)
            .bind(&redemption.code_value)
            .bind(redemption.redeemed_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let unit = *self;
        unit.tx.commit().await.map_err(map_write_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), Error> {
        let unit = *self;
        unit.tx.rollback().await?;
        Ok(())
    }
}
