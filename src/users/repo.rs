use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserChanges, DEFAULT_PROFILE_PICTURE};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{field} already exists")]
    Duplicate { field: &'static str },
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for user accounts.
///
/// Implementations enforce uniqueness of username, email and mobile
/// themselves; callers never check before writing.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, password_hash, mobile, \
                            is_admin, profile_picture, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash, mobile,
                               is_admin, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.mobile)
            .bind(user.is_admin)
            .bind(
                user.profile_picture
                    .as_deref()
                    .unwrap_or(DEFAULT_PROFILE_PICTURE),
            )
            .fetch_one(&self.db)
            .await
            .map_err(map_db_error)?;
        debug!(user_id = %created.id, "user row inserted");
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            UPDATE users SET
                username        = COALESCE($2, username),
                first_name      = COALESCE($3, first_name),
                last_name       = COALESCE($4, last_name),
                email           = COALESCE($5, email),
                mobile          = COALESCE($6, mobile),
                password_hash   = COALESCE($7, password_hash),
                profile_picture = COALESCE($8, profile_picture),
                updated_at      = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.username)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.email)
            .bind(changes.mobile)
            .bind(changes.password_hash)
            .bind(changes.profile_picture)
            .fetch_optional(&self.db)
            .await
            .map_err(map_db_error)?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Turn a unique-constraint violation into `Duplicate`, naming the column.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate {
                field: field_for_constraint(db.constraint()),
            };
        }
    }
    StoreError::Database(err)
}

fn field_for_constraint(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_username_key") => "username",
        Some("users_email_key") => "email",
        Some("users_mobile_key") => "mobile",
        _ => "record",
    }
}
