use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Default accounts that must survive administrative deletion.
pub const PROTECTED_USERNAMES: &[&str] = &["student", "KAB", "testuser"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub login_attempts: i32,
    pub locked_until: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str =
    "id, username, password_hash, role, status, login_attempts, locked_until, last_login, created_at";

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        username: &str,
        password_hash: &str,
        role: Role,
        status: UserStatus,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, role, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(status)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Persist a failed login attempt, locking the account when the
    /// policy says so.
    pub async fn record_failure(
        db: &PgPool,
        id: Uuid,
        attempts: i32,
        locked_until: Option<OffsetDateTime>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET login_attempts = $2, locked_until = $3 WHERE id = $1")
            .bind(id)
            .bind(attempts)
            .bind(locked_until)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Reset the lockout counters and stamp the login time after a
    /// successful authentication.
    pub async fn record_login(db: &PgPool, id: Uuid, now: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET login_attempts = 0, locked_until = NULL, last_login = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Store a fresh hash; a password change also clears any pending
    /// lockout state.
    pub async fn set_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, login_attempts = 0, locked_until = NULL WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(count)
    }
}

/// Seed the default accounts on an empty database. The admin account is
/// only created when ADMIN_PASSWORD is provided so no well-known
/// credential ends up in production by accident.
pub async fn seed_default_users(db: &PgPool) -> anyhow::Result<()> {
    if User::count(db).await? > 0 {
        return Ok(());
    }

    let student_password =
        std::env::var("DEFAULT_STUDENT_PASSWORD").unwrap_or_else(|_| "password123".into());
    let hash = crate::auth::password::hash_password(&student_password)?;
    User::create(db, "student", &hash, Role::Student, UserStatus::Active).await?;

    let hash = crate::auth::password::hash_password("password")?;
    User::create(db, "testuser", &hash, Role::Student, UserStatus::Suspended).await?;

    match std::env::var("ADMIN_PASSWORD") {
        Ok(admin_password) => {
            let admin_username =
                std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "KAB".into());
            let hash = crate::auth::password::hash_password(&admin_password)?;
            User::create(db, &admin_username, &hash, Role::Admin, UserStatus::Active).await?;
            tracing::info!(username = %admin_username, "default admin account created");
        }
        Err(_) => {
            tracing::warn!("ADMIN_PASSWORD not set; no admin account seeded");
        }
    }

    tracing::info!("default users initialized");
    Ok(())
}
