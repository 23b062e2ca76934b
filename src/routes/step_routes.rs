use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::step_controller::StepController;
use crate::dto::response::ApiResponse;
use crate::dto::step_dto::{
    AssignUsersRequest, CreateStepRequest, PipelineResponse, ReorderStepsRequest,
    StepAssignmentsResponse, StepResponse, UpdateStepRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_step_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_steps))
        .route("/", post(create_step))
        .route("/reorder", post(reorder_steps))
        .route("/:id", put(update_step))
        .route("/:id", delete(delete_step))
        .route("/:id/assignments", post(assign_users))
}

async fn list_steps(
    State(state): State<AppState>,
) -> Result<Json<PipelineResponse>, AppError> {
    let controller = StepController::new(state.pool.clone());
    let response = controller.list().await?;
    Ok(Json(response))
}

async fn create_step(
    State(state): State<AppState>,
    Json(request): Json<CreateStepRequest>,
) -> Result<Json<ApiResponse<StepResponse>>, AppError> {
    let controller = StepController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn update_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStepRequest>,
) -> Result<Json<ApiResponse<StepResponse>>, AppError> {
    let controller = StepController::new(state.pool.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn reorder_steps(
    State(state): State<AppState>,
    Json(request): Json<ReorderStepsRequest>,
) -> Result<Json<ApiResponse<PipelineResponse>>, AppError> {
    let controller = StepController::new(state.pool.clone());
    let response = controller.reorder(request).await?;
    Ok(Json(response))
}

async fn delete_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = StepController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Step eliminado exitosamente"
    })))
}

async fn assign_users(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignUsersRequest>,
) -> Result<Json<ApiResponse<StepAssignmentsResponse>>, AppError> {
    let controller = StepController::new(state.pool.clone());
    let response = controller.assign_users(id, request).await?;
    Ok(Json(response))
}
