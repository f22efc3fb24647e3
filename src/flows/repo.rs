use axum::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};

use crate::db::StoreError;
use crate::flows::repo_types::{Flow, FlowSummary, NewFlow};

/// Access to the `flows` table.
#[async_trait]
pub trait FlowRepo: Send + Sync {
    async fn create(&self, flow: NewFlow) -> Result<Flow, StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Flow>, StoreError>;
    /// Most recently updated first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<FlowSummary>, StoreError>;
    /// Replaces the payload only. `false` when no row matched.
    async fn update_content(&self, id: &str, flow: &Value) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgFlowRepo {
    db: PgPool,
}

impl PgFlowRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FlowRepo for PgFlowRepo {
    async fn create(&self, flow: NewFlow) -> Result<Flow, StoreError> {
        let row = sqlx::query_as::<_, Flow>(
            r#"
            INSERT INTO flows (id, user_id, flow_name, flow)
            VALUES ($1, $2, $3, $4::json)
            RETURNING id, user_id, flow_name, flow, created_at, updated_at
            "#,
        )
        .bind(&flow.id)
        .bind(&flow.user_id)
        .bind(&flow.flow_name)
        .bind(Json(&flow.flow))
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Flow>, StoreError> {
        let row = sqlx::query_as::<_, Flow>(
            r#"
            SELECT id, user_id, flow_name, flow, created_at, updated_at
              FROM flows
             WHERE id = $1
             LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<FlowSummary>, StoreError> {
        let rows = sqlx::query_as::<_, FlowSummary>(
            r#"
            SELECT id, flow_name, created_at, updated_at
              FROM flows
             WHERE user_id = $1
             ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update_content(&self, id: &str, flow: &Value) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE flows
               SET flow = $2::json, updated_at = (now() AT TIME ZONE 'utc')
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(flow))
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
