use async_trait::async_trait;
use helloworld_core::models::{Greeting, RecordId, ValidatedRecord};
use helloworld_core::{AppError, RecordStore};
use sqlx::{PgPool, Postgres};

/// Repository for greetings
#[derive(Clone)]
pub struct GreetingRepository {
    pool: PgPool,
}

impl GreetingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a greeting and return its id
    #[tracing::instrument(skip(self, record), fields(db.table = "helloworld", db.operation = "insert"))]
    pub async fn insert(&self, record: &ValidatedRecord) -> Result<RecordId, AppError> {
        let id = sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO helloworld (greeting, image_path, created_by)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&record.greeting)
        .bind(&record.image_path)
        .bind(record.created_by)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(record_id = id, "Greeting stored");
        Ok(id)
    }

    /// Get greeting by ID
    #[tracing::instrument(skip(self), fields(db.table = "helloworld", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: RecordId) -> Result<Option<Greeting>, AppError> {
        let greeting = sqlx::query_as::<Postgres, Greeting>(
            "SELECT id, greeting, image_path, created_by, created_at FROM helloworld WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(greeting)
    }

    /// Most recent greetings first
    #[tracing::instrument(skip(self), fields(db.table = "helloworld", db.operation = "select"))]
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Greeting>, AppError> {
        let greetings = sqlx::query_as::<Postgres, Greeting>(
            "SELECT id, greeting, image_path, created_by, created_at FROM helloworld ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(greetings)
    }

    /// Full-text search over indexed greetings
    #[tracing::instrument(skip(self), fields(db.table = "helloworld", db.operation = "select"))]
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<Greeting>, AppError> {
        let greetings = sqlx::query_as::<Postgres, Greeting>(
            r#"
            SELECT id, greeting, image_path, created_by, created_at
            FROM helloworld
            WHERE search_vector @@ plainto_tsquery('simple', $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(greetings)
    }

    /// Recompute the search vector of one row
    #[tracing::instrument(skip(self), fields(db.table = "helloworld", db.operation = "update", db.record_id = %id))]
    pub async fn rebuild_search_vector(&self, id: RecordId) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE helloworld SET search_vector = to_tsvector('simple', greeting) WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Greeting {} not found", id)));
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStore for GreetingRepository {
    async fn save(&self, record: &ValidatedRecord) -> Result<RecordId, AppError> {
        self.insert(record).await
    }

    async fn reindex(&self, id: RecordId) -> Result<(), AppError> {
        self.rebuild_search_vector(id).await
    }
}
