use async_trait::async_trait;
use shared::types::User;
use sqlx::{FromRow, PgPool};

use super::to_count;
use crate::{
    domain::{
        Viewer, Window,
        user::{NewUser, UpdateUser, UserCredentials, UserRepository},
    },
    error::DocumentServiceError,
};

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> DocumentServiceError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => DocumentServiceError::field(
            "username",
            "A user with that username already exists.",
        ),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            DocumentServiceError::Conflict(
                "Cannot delete this user because documents or signatures reference them."
                    .to_string(),
            )
        }
        _ => e.into(),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DocumentServiceError> {
        let output = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, first_name, last_name, role, is_active, date_joined, last_login
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_credentials(
        &self,
        username: String,
    ) -> Result<Option<UserCredentials>, DocumentServiceError> {
        let output = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, username, email, first_name, last_name, role, is_active, date_joined, last_login,
                   password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output.map(|row| UserCredentials {
            user: row.user,
            password_hash: row.password_hash,
        }))
    }

    #[tracing::instrument(skip(self))]
    async fn password_hash(&self, id: i64) -> Result<Option<String>, DocumentServiceError> {
        let output = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn count(&self, viewer: Viewer) -> Result<u64, DocumentServiceError> {
        let output = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1 OR id = $2)
            "#,
        )
        .bind(viewer.sees_everything())
        .bind(viewer.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(output))
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, viewer: Viewer, window: Window) -> Result<Vec<User>, DocumentServiceError> {
        let output = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, first_name, last_name, role, is_active, date_joined, last_login
            FROM users
            WHERE ($1 OR id = $2)
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(viewer.sees_everything())
        .bind(viewer.user_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self, user), fields(username = %user.username))]
    async fn create(&self, user: NewUser) -> Result<User, DocumentServiceError> {
        let output = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, first_name, last_name, role, is_active, date_joined, last_login
            "#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.role)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, id: i64, user: UpdateUser) -> Result<Option<User>, DocumentServiceError> {
        let output = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name)
            WHERE id = $1
            RETURNING id, username, email, first_name, last_name, role, is_active, date_joined, last_login
            "#,
        )
        .bind(id)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self, password_hash))]
    async fn set_password(&self, id: i64, password_hash: String) -> Result<(), DocumentServiceError> {
        let output = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if output.rows_affected() == 0 {
            return Err(DocumentServiceError::not_found());
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn record_login(&self, id: i64) -> Result<(), DocumentServiceError> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, DocumentServiceError> {
        let output = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(output.rows_affected() > 0)
    }
}
