use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::flows::repo_types::FlowSummary;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub flow_name: String,
    #[serde(default)]
    pub flow: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFlowRequest {
    #[serde(default)]
    pub flow_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFlowsRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlowRequest {
    #[serde(default)]
    pub flow_id: String,
    #[serde(default)]
    pub flow: Option<Value>,
}

/// Response of createFlow and updateFlow.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowIdResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
}

impl FlowIdResponse {
    pub fn ok(message: &str, flow_id: String) -> Self {
        Self {
            success: true,
            message: message.into(),
            flow_id: Some(flow_id),
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            flow_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetFlowResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_name: Option<String>,
}

impl GetFlowResponse {
    pub fn fail(message: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            flow: None,
            flow_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowItem {
    pub id: String,
    pub flow_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Stored timestamps are UTC without a zone.
impl From<FlowSummary> for FlowItem {
    fn from(s: FlowSummary) -> Self {
        Self {
            id: s.id,
            flow_name: s.flow_name,
            created_at: s.created_at.assume_utc(),
            updated_at: s.updated_at.assume_utc(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ListFlowsResponse {
    pub success: bool,
    pub message: String,
    pub flows: Vec<FlowItem>,
}

impl ListFlowsResponse {
    pub fn fail(message: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            flows: Vec::new(),
        }
    }
}

/// JSON `null`, `false`, `0` and `""` count as a missing payload.
pub fn is_missing_payload(flow: Option<&Value>) -> bool {
    match flow {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
