use axum::{extract::State, Json};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::StoreError,
    flows::{
        dto::{
            is_missing_payload, CreateFlowRequest, FlowIdResponse, FlowItem, GetFlowRequest,
            GetFlowResponse, ListFlowsRequest, ListFlowsResponse, UpdateFlowRequest,
        },
        repo_types::NewFlow,
    },
    state::AppState,
};

pub const MAX_FLOW_NAME_CHARS: usize = 255;

const USER_NOT_FOUND: &str = "User not found";
const FLOW_NOT_FOUND: &str = "Flow not found";
const FLOW_EXISTS: &str = "A flow with this data already exists";

#[instrument(skip(state, payload))]
pub async fn create_flow(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlowRequest>,
) -> Json<FlowIdResponse> {
    if payload.user_id.is_empty()
        || payload.flow_name.is_empty()
        || is_missing_payload(payload.flow.as_ref())
    {
        return Json(FlowIdResponse::fail(
            "Missing required fields: userId, flowName, and flow are required",
        ));
    }
    if payload.flow_name.chars().count() > MAX_FLOW_NAME_CHARS {
        return Json(FlowIdResponse::fail("Flow name must be 255 characters or less"));
    }

    match state.users.find_by_id(&payload.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Json(FlowIdResponse::fail(USER_NOT_FOUND)),
        Err(e) => {
            error!(error = %e, user_id = %payload.user_id, "create_flow owner lookup failed");
            return Json(FlowIdResponse::fail("Flow creation failed. Please try again."));
        }
    }

    let new_flow = NewFlow {
        id: Uuid::new_v4().to_string(),
        user_id: payload.user_id,
        flow_name: payload.flow_name,
        flow: payload.flow.unwrap_or_default(),
    };

    match state.flows.create(new_flow).await {
        Ok(flow) => {
            info!(flow_id = %flow.id, user_id = %flow.user_id, "flow created");
            Json(FlowIdResponse::ok("Flow created successfully", flow.id))
        }
        Err(StoreError::UniqueViolation { field }) => {
            warn!(%field, "create_flow unique violation");
            Json(FlowIdResponse::fail(FLOW_EXISTS))
        }
        Err(StoreError::ForeignKeyViolation { field }) => {
            warn!(%field, "create_flow owner vanished");
            Json(FlowIdResponse::fail(USER_NOT_FOUND))
        }
        Err(e) => {
            error!(error = %e, "create_flow failed");
            Json(FlowIdResponse::fail("Flow creation failed. Please try again."))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn get_flow(
    State(state): State<AppState>,
    Json(payload): Json<GetFlowRequest>,
) -> Json<GetFlowResponse> {
    if payload.flow_id.is_empty() {
        return Json(GetFlowResponse::fail("Missing required field: flowId is required"));
    }

    match state.flows.find_by_id(&payload.flow_id).await {
        Ok(Some(flow)) => Json(GetFlowResponse {
            success: true,
            message: "Flow retrieved successfully".into(),
            flow: Some(flow.flow),
            flow_name: Some(flow.flow_name),
        }),
        Ok(None) => Json(GetFlowResponse::fail(FLOW_NOT_FOUND)),
        Err(e) => {
            error!(error = %e, flow_id = %payload.flow_id, "get_flow failed");
            Json(GetFlowResponse::fail("Failed to retrieve flow. Please try again."))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn list_flows(
    State(state): State<AppState>,
    Json(payload): Json<ListFlowsRequest>,
) -> Json<ListFlowsResponse> {
    if payload.user_id.is_empty() {
        return Json(ListFlowsResponse::fail("Missing required field: userId is required"));
    }

    let listed = async {
        if state.users.find_by_id(&payload.user_id).await?.is_none() {
            return Ok(None);
        }
        let flows = state.flows.list_by_user(&payload.user_id).await?;
        Ok::<_, StoreError>(Some(flows))
    }
    .await;

    match listed {
        Ok(Some(flows)) => Json(ListFlowsResponse {
            success: true,
            message: "Flows retrieved successfully".into(),
            flows: flows.into_iter().map(FlowItem::from).collect(),
        }),
        Ok(None) => Json(ListFlowsResponse::fail(USER_NOT_FOUND)),
        Err(e) => {
            error!(error = %e, user_id = %payload.user_id, "list_flows failed");
            Json(ListFlowsResponse::fail("Failed to retrieve flows. Please try again."))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_flow(
    State(state): State<AppState>,
    Json(payload): Json<UpdateFlowRequest>,
) -> Json<FlowIdResponse> {
    if payload.flow_id.is_empty() {
        return Json(FlowIdResponse::fail("Missing required field: flowId is required"));
    }
    let flow = match payload.flow {
        Some(flow) if !is_missing_payload(Some(&flow)) => flow,
        _ => return Json(FlowIdResponse::fail("Flow data is required")),
    };

    let updated = async {
        if state.flows.find_by_id(&payload.flow_id).await?.is_none() {
            return Ok::<_, StoreError>(false);
        }
        state.flows.update_content(&payload.flow_id, &flow).await
    }
    .await;

    match updated {
        Ok(true) => {
            info!(flow_id = %payload.flow_id, "flow updated");
            Json(FlowIdResponse::ok("Flow updated successfully", payload.flow_id))
        }
        Ok(false) => Json(FlowIdResponse::fail(FLOW_NOT_FOUND)),
        Err(StoreError::UniqueViolation { field }) => {
            warn!(%field, "update_flow unique violation");
            Json(FlowIdResponse::fail(FLOW_EXISTS))
        }
        Err(e) => {
            error!(error = %e, flow_id = %payload.flow_id, "update_flow failed");
            Json(FlowIdResponse::fail("Flow update failed. Please try again."))
        }
    }
}
