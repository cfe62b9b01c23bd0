//! # User Repository
//!
//! Accounts for cashiers and admins. The first account ever registered
//! becomes the admin; the role is chosen inside the INSERT so two
//! concurrent registrations cannot both claim it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use justcani_core::{NewUser, User};

const USER_COLUMNS: &str =
    "id, username, email, whatsapp, password_hash, role, profile_pic, created_at";

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user with the role given in `user`.
    ///
    /// ## Errors
    /// `UniqueViolation` on `users.username` or `users.email`.
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        debug!(username = %user.username, role = user.role.as_str(), "Inserting user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, whatsapp, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.whatsapp)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_with_value(e.into(), user))?;

        self.require(result.last_insert_rowid()).await
    }

    /// Registers a self-service account.
    ///
    /// The role in `user` is ignored: the account is `admin` when the
    /// table is empty and `cashier` otherwise.
    pub async fn register(&self, user: &NewUser) -> DbResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, whatsapp, password_hash, role, created_at)
            SELECT ?1, ?2, ?3, ?4,
                   CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'cashier' ELSE 'admin' END,
                   ?5
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.whatsapp)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_with_value(e.into(), user))?;

        let created = self.require(result.last_insert_rowid()).await?;
        info!(
            user_id = created.id,
            username = %created.username,
            role = created.role.as_str(),
            "User registered"
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Looks a user up by username or email, for login.
    ///
    /// Both columns are `COLLATE NOCASE`, so matching ignores ASCII case.
    pub async fn find_by_login(&self, login: &str) -> DbResult<Option<User>> {
        let login = login.trim();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE username = ?1 OR email = ?1
            ORDER BY username = ?1 DESC
            LIMIT 1
            "#
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Stores the public URL of a processed profile picture.
    pub async fn update_profile_pic(&self, id: i64, url: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET profile_pic = ?2 WHERE id = ?1")
            .bind(id)
            .bind(url)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id.to_string()));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn require(&self, id: i64) -> DbResult<User> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id.to_string()))
    }
}

/// Fills in which value collided, based on the column SQLite named.
fn duplicate_with_value(err: DbError, user: &NewUser) -> DbError {
    let on_email =
        matches!(&err, DbError::UniqueViolation { field, .. } if field.ends_with(".email"));

    if on_email {
        err.with_value(&user.email)
    } else {
        err.with_value(&user.username)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
