use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use time::PrimitiveDateTime;

/// Flow record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Flow {
    pub id: String,
    pub user_id: String,
    pub flow_name: String,
    pub flow: Value,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

/// Listing projection; the payload stays in the database.
#[derive(Debug, Clone, FromRow)]
pub struct FlowSummary {
    pub id: String,
    pub flow_name: String,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFlow {
    pub id: String,
    pub user_id: String,
    pub flow_name: String,
    pub flow: Value,
}

impl From<&Flow> for FlowSummary {
    fn from(f: &Flow) -> Self {
        Self {
            id: f.id.clone(),
            flow_name: f.flow_name.clone(),
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}
