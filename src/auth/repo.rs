use axum::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, User};
use crate::db::StoreError;

// `email_verified` is nullable in tables created by earlier deployments.
const USER_COLUMNS: &str = "id, email, username, avatar, password, \
     COALESCE(email_verified, FALSE) AS email_verified, \
     email_verification_token, last_login_at, created_at, updated_at";

/// Access to the `users` table.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, StoreError>;
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn touch_last_login(&self, id: &str) -> Result<(), StoreError>;
    async fn set_verification_token(&self, id: &str, token: &str) -> Result<(), StoreError>;
    /// Sets `email_verified` and clears the token.
    async fn mark_verified(&self, id: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1 LIMIT 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.find_one("id", id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_one("username", username).await
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        self.find_one("email_verification_token", token).await
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, username, password, email_verified, email_verification_token)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.verification_token)
            .fetch_one(&self.db)
            .await?;
        Ok(created)
    }

    async fn touch_last_login(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
               SET last_login_at = (now() AT TIME ZONE 'utc'),
                   updated_at = (now() AT TIME ZONE 'utc')
             WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn set_verification_token(&self, id: &str, token: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
               SET email_verification_token = $2, updated_at = (now() AT TIME ZONE 'utc')
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn mark_verified(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
               SET email_verified = TRUE,
                   email_verification_token = NULL,
                   updated_at = (now() AT TIME ZONE 'utc')
             WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
