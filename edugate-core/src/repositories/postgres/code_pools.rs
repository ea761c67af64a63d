// File: edugate-core/src/repositories/postgres/code_pools.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use edugate_common::error::{ConflictCause, Error};
use edugate_common::models::{
    Code, CodePool, Page, PageRequest, PoolDeletion, PoolEntitlements, PoolFilter, PoolSummary,
};
use edugate_common::traits::CodePoolRepository;

use super::map_write_error;

pub struct PostgresCodePoolRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCodePoolRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Reads the `code_pools` columns of a row. Shared with the redemption
/// store, whose lookup joins the pool onto the code.
pub(crate) fn pool_from_row(r: &PgRow) -> Result<CodePool, sqlx::Error> {
    Ok(CodePool {
        pool_id: r.try_get("pool_id")?,
        name: r.try_get("name")?,
        expiration: r.try_get::<DateTime<Utc>, _>("expiration")?,
        entitlements: PoolEntitlements {
            materials_with_questions: r.try_get::<Vec<Uuid>, _>("materials_with_questions")?,
            materials_with_lectures: r.try_get::<Vec<Uuid>, _>("materials_with_lectures")?,
            courses: r.try_get::<Vec<Uuid>, _>("courses")?,
        },
        created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

// Bind order for every filtered pool query: $1 name, $2 material, $3 course,
// $4 expiration_from, $5 expiration_to.
const POOL_FILTER_SQL: &str = r#"
    ($1::text IS NULL OR p.name ILIKE '%' || $1 || '%')
    AND ($2::uuid IS NULL OR $2 = ANY(p.materials_with_questions) OR $2 = ANY(p.materials_with_lectures))
    AND ($3::uuid IS NULL OR $3 = ANY(p.courses))
    AND ($4::timestamptz IS NULL OR p.expiration >= $4)
    AND ($5::timestamptz IS NULL OR p.expiration <= $5)
"#;

#[async_trait]
impl CodePoolRepository for PostgresCodePoolRepository {
    async fn create_pool(&self, pool: &CodePool, code_values: &[String]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO code_pools (
                pool_id,
                name,
                expiration,
                materials_with_questions,
                materials_with_lectures,
                courses,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
            .bind(pool.pool_id)
            .bind(&pool.name)
            .bind(pool.expiration)
            .bind(&pool.entitlements.materials_with_questions)
            .bind(&pool.entitlements.materials_with_lectures)
            .bind(&pool.entitlements.courses)
            .bind(pool.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        sqlx::query(
            r#"
            INSERT INTO codes (code_value, pool_id, is_used)
            SELECT v, $2, FALSE FROM UNNEST($1::text[]) AS v
            "#,
        )
            .bind(code_values)
            .bind(pool.pool_id)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        tx.commit().await.map_err(map_write_error)?;
        Ok(())
    }

    async fn get_pool(&self, pool_id: Uuid) -> Result<Option<CodePool>, Error> {
        let row = sqlx::query(
            r#"
            SELECT pool_id,
                   name,
                   expiration,
                   materials_with_questions,
                   materials_with_lectures,
                   courses,
                   created_at
            FROM code_pools
            WHERE pool_id = $1
            "#,
        )
            .bind(pool_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(pool_from_row(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_pools(&self, filter: &PoolFilter, page: PageRequest) -> Result<Page<PoolSummary>, Error> {
        let count_sql = format!("SELECT COUNT(*) FROM code_pools p WHERE {POOL_FILTER_SQL}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.name.as_deref())
            .bind(filter.material)
            .bind(filter.course)
            .bind(filter.expiration_from)
            .bind(filter.expiration_to)
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            r#"
            SELECT p.pool_id,
                   p.name,
                   p.expiration,
                   p.materials_with_questions,
                   p.materials_with_lectures,
                   p.courses,
                   p.created_at,
                   COUNT(c.code_value) AS total_codes,
                   COUNT(c.code_value) FILTER (WHERE c.is_used) AS used_codes
            FROM code_pools p
            LEFT JOIN codes c ON c.pool_id = p.pool_id
            WHERE {POOL_FILTER_SQL}
            GROUP BY p.pool_id
            ORDER BY p.created_at DESC, p.pool_id
            LIMIT $6 OFFSET $7
            "#
        );
        let rows = sqlx::query(&list_sql)
            .bind(filter.name.as_deref())
            .bind(filter.material)
            .bind(filter.course)
            .bind(filter.expiration_from)
            .bind(filter.expiration_to)
            .bind(i64::from(page.limit))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for r in rows {
            docs.push(PoolSummary {
                pool: pool_from_row(&r)?,
                total_codes: r.try_get("total_codes")?,
                used_codes: r.try_get("used_codes")?,
            });
        }
        Ok(Page::new(docs, total.max(0) as u64, page))
    }

    async fn list_codes(&self, pool_id: Uuid) -> Result<Vec<Code>, Error> {
        let codes = sqlx::query_as::<_, Code>(
            r#"
            SELECT code_value, pool_id, is_used, used_at
            FROM codes
            WHERE pool_id = $1
            ORDER BY code_value
            "#,
        )
            .bind(pool_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(codes)
    }

    async fn get_code(&self, code_value: &str) -> Result<Option<Code>, Error> {
        let code = sqlx::query_as::<_, Code>(
            r#"
            SELECT code_value, pool_id, is_used, used_at
            FROM codes
            WHERE code_value = $1
            "#,
        )
            .bind(code_value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(code)
    }

    async fn delete_pool_cascade(&self, pool_id: Uuid) -> Result<PoolDeletion, Error> {
        let mut tx = self.pool.begin().await?;

        // Conflicts with the FOR SHARE a redemption takes on its pool.
        let locked = sqlx::query("SELECT pool_id FROM code_pools WHERE pool_id = $1 FOR UPDATE")
            .bind(pool_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?;
        if locked.is_none() {
            return Err(Error::NotFound(format!("codes group {pool_id}")));
        }

        let used: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM codes WHERE pool_id = $1 AND is_used",
        )
            .bind(pool_id)
            .fetch_one(&mut *tx)
            .await?;
        if used > 0 {
            return Err(Error::Conflict(ConflictCause::PoolHasUsedCodes));
        }

        let redemptions = sqlx::query("DELETE FROM student_redemptions WHERE pool_id = $1")
            .bind(pool_id)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        let codes = sqlx::query("DELETE FROM codes WHERE pool_id = $1")
            .bind(pool_id)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        sqlx::query("DELETE FROM code_pools WHERE pool_id = $1")
            .bind(pool_id)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        tx.commit().await.map_err(map_write_error)?;

        Ok(PoolDeletion {
            codes_removed: codes.rows_affected(),
            redemptions_removed: redemptions.rows_affected(),
        })
    }
}
