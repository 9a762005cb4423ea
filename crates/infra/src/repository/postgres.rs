//! Postgres-backed collections.
//!
//! Each record is stored as a JSONB document next to the columns that are
//! queried or constrained (`email`, `biz_number`, `user_id`).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation on `biz_number`) | `23505` | `DuplicateBizNumber` |
//! | anything else | any | `Storage` |

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use bizcard_core::{CardId, UserId};
use bizcard_directory::{Card, LikeState, User};

use super::{CardRepository, RepoResult, RepositoryError, UserRepository};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        doc JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS users_email_lower_idx ON users (LOWER(email))",
    r#"
    CREATE TABLE IF NOT EXISTS cards (
        id UUID PRIMARY KEY,
        biz_number BIGINT NOT NULL,
        user_id UUID NOT NULL,
        doc JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT cards_biz_number_key UNIQUE (biz_number)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS cards_user_id_idx ON cards (user_id)",
];

/// Create tables and indexes if missing. Idempotent.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> RepoResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", None, e))?;
    }
    Ok(())
}

fn map_sqlx_error(operation: &str, biz_number: Option<u64>, err: sqlx::Error) -> RepositoryError {
    match (&err, biz_number) {
        (sqlx::Error::Database(db_err), Some(n)) if db_err.code().as_deref() == Some("23505") => {
            RepositoryError::DuplicateBizNumber(n)
        }
        (sqlx::Error::Database(db_err), _) => {
            RepositoryError::Storage(format!("database error in {}: {}", operation, db_err.message()))
        }
        (sqlx::Error::PoolClosed, _) => {
            RepositoryError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => RepositoryError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn biz_column(biz_number: u64) -> RepoResult<i64> {
    i64::try_from(biz_number)
        .map_err(|_| RepositoryError::Storage(format!("bizNumber {} out of range", biz_number)))
}

fn decode<T: DeserializeOwned>(row: &PgRow) -> RepoResult<T> {
    let doc: serde_json::Value = row
        .try_get("doc")
        .map_err(|e| RepositoryError::Storage(format!("failed to read document: {}", e)))?;
    serde_json::from_value(doc)
        .map_err(|e| RepositoryError::Storage(format!("failed to decode document: {}", e)))
}

fn decode_all<T: DeserializeOwned>(rows: &[PgRow]) -> RepoResult<Vec<T>> {
    rows.iter().map(decode).collect()
}

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: User) -> RepoResult<User> {
        sqlx::query("INSERT INTO users (id, email, doc) VALUES ($1, $2, $3)")
            .bind(user.id.as_uuid())
            .bind(&user.profile.email)
            .bind(Json(&user))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", None, e))?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = sqlx::query("SELECT doc FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", None, e))?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query("SELECT doc FROM users WHERE LOWER(email) = LOWER($1) ORDER BY created_at ASC, id ASC LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", None, e))?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query("SELECT doc FROM users ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", None, e))?;
        decode_all(&rows)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update(&self, user: User) -> RepoResult<Option<User>> {
        let result = sqlx::query("UPDATE users SET email = $2, doc = $3 WHERE id = $1")
            .bind(user.id.as_uuid())
            .bind(&user.profile.email)
            .bind(Json(&user))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", None, e))?;
        Ok((result.rows_affected() > 0).then_some(user))
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = sqlx::query("DELETE FROM users WHERE id = $1 RETURNING doc")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", None, e))?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self), err)]
    async fn count(&self) -> RepoResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users", None, e))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCardRepository {
    pool: PgPool,
}

impl PostgresCardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardRepository for PostgresCardRepository {
    #[instrument(skip(self, card), fields(card_id = %card.id, biz_number = card.biz_number), err)]
    async fn insert(&self, card: Card) -> RepoResult<Card> {
        sqlx::query("INSERT INTO cards (id, biz_number, user_id, doc) VALUES ($1, $2, $3, $4)")
            .bind(card.id.as_uuid())
            .bind(biz_column(card.biz_number)?)
            .bind(card.owner.as_uuid())
            .bind(Json(&card))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_card", Some(card.biz_number), e))?;
        Ok(card)
    }

    #[instrument(skip(self), fields(card_id = %id), err)]
    async fn get(&self, id: CardId) -> RepoResult<Option<Card>> {
        let row = sqlx::query("SELECT doc FROM cards WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_card", None, e))?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> RepoResult<Vec<Card>> {
        let rows = sqlx::query("SELECT doc FROM cards ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_cards", None, e))?;
        decode_all(&rows)
    }

    #[instrument(skip(self), fields(owner = %owner), err)]
    async fn list_by_owner(&self, owner: UserId) -> RepoResult<Vec<Card>> {
        let rows = sqlx::query("SELECT doc FROM cards WHERE user_id = $1 ORDER BY created_at ASC, id ASC")
            .bind(owner.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_cards_by_owner", None, e))?;
        decode_all(&rows)
    }

    #[instrument(skip(self), err)]
    async fn find_by_biz_number_excluding(
        &self,
        biz_number: u64,
        exclude: Option<CardId>,
    ) -> RepoResult<Option<Card>> {
        let row = sqlx::query(
            "SELECT doc FROM cards WHERE biz_number = $1 AND ($2::uuid IS NULL OR id <> $2) LIMIT 1",
        )
        .bind(biz_column(biz_number)?)
        .bind(exclude.map(|id| *id.as_uuid()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_card_by_biz_number", None, e))?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self, card), fields(card_id = %card.id, biz_number = card.biz_number), err)]
    async fn update(&self, card: Card) -> RepoResult<Option<Card>> {
        let result = sqlx::query("UPDATE cards SET biz_number = $2, user_id = $3, doc = $4 WHERE id = $1")
            .bind(card.id.as_uuid())
            .bind(biz_column(card.biz_number)?)
            .bind(card.owner.as_uuid())
            .bind(Json(&card))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_card", Some(card.biz_number), e))?;
        Ok((result.rows_affected() > 0).then_some(card))
    }

    #[instrument(skip(self), fields(card_id = %id), err)]
    async fn delete(&self, id: CardId) -> RepoResult<Option<Card>> {
        let row = sqlx::query("DELETE FROM cards WHERE id = $1 RETURNING doc")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_card", None, e))?;
        row.as_ref().map(decode).transpose()
    }

    /// One conditional UPDATE: remove the id if present, append it otherwise.
    #[instrument(skip(self), fields(card_id = %id, user_id = %user), err)]
    async fn toggle_like(&self, id: CardId, user: UserId) -> RepoResult<Option<(Card, LikeState)>> {
        let row = sqlx::query(
            r#"
            UPDATE cards
            SET doc = jsonb_set(
                doc,
                '{likes}',
                CASE
                    WHEN COALESCE(doc->'likes', '[]'::jsonb) @> jsonb_build_array($2::text)
                        THEN (doc->'likes') - $2::text
                    ELSE COALESCE(doc->'likes', '[]'::jsonb) || jsonb_build_array($2::text)
                END
            )
            WHERE id = $1
            RETURNING doc
            "#,
        )
        .bind(id.as_uuid())
        .bind(user.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("toggle_like", None, e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let card: Card = decode(&row)?;
        let state = if card.is_liked_by(user) {
            LikeState::Liked
        } else {
            LikeState::Unliked
        };
        Ok(Some((card, state)))
    }

    #[instrument(skip(self), fields(card_id = %id), err)]
    async fn set_biz_number(&self, id: CardId, biz_number: u64) -> RepoResult<Option<Card>> {
        let column = biz_column(biz_number)?;
        let row = sqlx::query(
            r#"
            UPDATE cards
            SET biz_number = $2, doc = jsonb_set(doc, '{bizNumber}', to_jsonb($2::bigint))
            WHERE id = $1
            RETURNING doc
            "#,
        )
        .bind(id.as_uuid())
        .bind(column)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_biz_number", Some(biz_number), e))?;
        row.as_ref().map(decode).transpose()
    }
}
