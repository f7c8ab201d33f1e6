use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use ble_core::service::error::ServiceError;

use super::dto::ToolListRestDTO;
use crate::dto::response::OkOrErrorResponse;
use crate::router::AppState;

pub(crate) async fn get_tools(state: State<AppState>) -> Json<ToolListRestDTO> {
    Json(state.core.tool_service.list_tools().into())
}

/// Body is the JSON object of tool arguments; an empty body means no arguments.
pub(crate) async fn call_tool(
    state: State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> OkOrErrorResponse<serde_json::Value> {
    let result = match arguments_from_body(&body) {
        Ok(arguments) => state.core.tool_service.call_tool(&name, arguments).await,
        Err(error) => Err(error),
    };

    OkOrErrorResponse::from_result(
        result,
        state.config.hide_error_response_cause,
        &format!("calling tool `{name}`"),
    )
}

fn arguments_from_body(body: &[u8]) -> Result<serde_json::Value, ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_slice(body).map_err(|err| ServiceError::MalformedRequest(err.to_string()))
}
