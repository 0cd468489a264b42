use async_trait::async_trait;
use helloworld_core::models::UserProfile;
use helloworld_core::{AppError, UserDirectory};
use sqlx::{PgPool, Postgres};

/// Read access to registered users
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn get_user(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        let user = sqlx::query_as::<Postgres, UserProfile>(
            "SELECT id, username, email FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_user(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        self.get_user(id).await
    }
}
