use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Note, RefreshToken, User};

/// Storage for notes, keyed by note id
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>, DatabaseError>;

    /// All notes of one owner, oldest first
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Note>, DatabaseError>;

    /// Insert the note, or update title/content/color of an existing note with
    /// the same id and owner. `created_at` and `owner_id` of an existing note
    /// are never touched. Returns `None` when the id belongs to another owner.
    async fn save(&self, note: &Note) -> Result<Option<Note>, DatabaseError>;

    /// Overwrite title/content/color of an existing note with the same id and
    /// owner. Never inserts; `None` when no such note exists.
    async fn update(&self, note: &Note) -> Result<Option<Note>, DatabaseError>;

    /// Returns whether a note was removed
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` when the email is taken
    async fn insert(&self, user: &User) -> Result<User, DatabaseError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DatabaseError>;

    /// Remove a stored token, returning it when it was present
    async fn take(&self, user_id: Uuid, hashed_token: &str) -> Result<Option<RefreshToken>, DatabaseError>;

    /// Drop tokens that expired before `now`, returning how many were removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;
}

const NOTE_COLUMNS: &str = "id, title, content, color, created_at, owner_id";

pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>, DatabaseError> {
        let sql = format!("SELECT {} FROM notes WHERE id = $1", NOTE_COLUMNS);
        let note = sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Note>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM notes WHERE owner_id = $1 ORDER BY created_at, id",
            NOTE_COLUMNS
        );
        let notes = sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(notes)
    }

    async fn save(&self, note: &Note) -> Result<Option<Note>, DatabaseError> {
        // The WHERE on the conflict branch makes the ownership check and the
        // write a single statement; a foreign id yields no row.
        let sql = format!(
            r#"
            INSERT INTO notes ({cols})
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
                SET title = EXCLUDED.title,
                    content = EXCLUDED.content,
                    color = EXCLUDED.color
                WHERE notes.owner_id = EXCLUDED.owner_id
            RETURNING {cols}
            "#,
            cols = NOTE_COLUMNS
        );
        let saved = sqlx::query_as::<_, Note>(&sql)
            .bind(note.id)
            .bind(&note.title)
            .bind(&note.content)
            .bind(note.color)
            .bind(note.created_at)
            .bind(note.owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(saved)
    }

    async fn update(&self, note: &Note) -> Result<Option<Note>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE notes
            SET title = $2, content = $3, color = $4
            WHERE id = $1 AND owner_id = $5
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );
        let updated = sqlx::query_as::<_, Note>(&sql)
            .bind(note.id)
            .bind(&note.title)
            .bind(&note.content)
            .bind(note.color)
            .bind(note.owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<User, DatabaseError> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_optional(&self.pool)
        .await?;

        inserted.ok_or_else(|| DatabaseError::Conflict(format!("email '{}' is taken", user.email)))
    }
}

pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, hashed_token, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token.user_id)
        .bind(&token.hashed_token)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take(&self, user_id: Uuid, hashed_token: &str) -> Result<Option<RefreshToken>, DatabaseError> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            DELETE FROM refresh_tokens
            WHERE user_id = $1 AND hashed_token = $2
            RETURNING user_id, hashed_token, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(hashed_token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
