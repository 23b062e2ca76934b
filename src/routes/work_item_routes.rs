use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::work_item_controller::WorkItemController;
use crate::dto::response::ApiResponse;
use crate::dto::work_item_dto::{
    CompleteWorkItemRequest, CreateWorkItemRequest, ReasonRequest, ScheduleWorkItemRequest,
    UpdateWorkItemRequest, WorkItemResponse,
};
use crate::services::lifecycle_service::Transition;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_work_item_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_work_item))
        .route("/vehicle/:vehicle_id", get(list_by_vehicle))
        .route("/:id", get(get_work_item))
        .route("/:id", put(update_work_item))
        .route("/:id", delete(delete_work_item))
        .route("/:id/approve", post(approve))
        .route("/:id/decline", post(decline))
        .route("/:id/schedule", post(schedule))
        .route("/:id/start", post(start))
        .route("/:id/pause", post(pause))
        .route("/:id/resume", post(resume))
        .route("/:id/block", post(block))
        .route("/:id/unblock", post(unblock))
        .route("/:id/complete", post(complete))
        .route("/:id/cancel", post(cancel))
}

fn controller(state: &AppState) -> WorkItemController {
    WorkItemController::new(state.pool.clone(), &state.config, state.http_client.clone())
}

async fn create_work_item(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkItemRequest>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state).create(request).await?;
    Ok(Json(response))
}

async fn get_work_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkItemResponse>, AppError> {
    let response = controller(&state).get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_by_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vec<WorkItemResponse>>, AppError> {
    let response = controller(&state).list_by_vehicle(vehicle_id).await?;
    Ok(Json(response))
}

async fn update_work_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkItemRequest>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state).update(id, request).await?;
    Ok(Json(response))
}

async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state).transition(id, Transition::Approve).await?;
    Ok(Json(response))
}

async fn decline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReasonRequest>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state)
        .transition(id, Transition::Decline { reason: request.reason })
        .await?;
    Ok(Json(response))
}

async fn schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ScheduleWorkItemRequest>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state)
        .transition(
            id,
            Transition::Schedule {
                scheduled_for: request.scheduled_for,
            },
        )
        .await?;
    Ok(Json(response))
}

async fn start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state).transition(id, Transition::Start).await?;
    Ok(Json(response))
}

async fn pause(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReasonRequest>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state)
        .transition(id, Transition::Pause { reason: request.reason })
        .await?;
    Ok(Json(response))
}

async fn resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state).transition(id, Transition::Resume).await?;
    Ok(Json(response))
}

async fn block(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReasonRequest>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state)
        .transition(id, Transition::Block { reason: request.reason })
        .await?;
    Ok(Json(response))
}

async fn unblock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state).transition(id, Transition::Unblock).await?;
    Ok(Json(response))
}

async fn complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteWorkItemRequest>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state)
        .transition(
            id,
            Transition::Complete {
                actual_cost: request.actual_cost,
                actual_hours: request.actual_hours,
            },
        )
        .await?;
    Ok(Json(response))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReasonRequest>,
) -> Result<Json<ApiResponse<WorkItemResponse>>, AppError> {
    let response = controller(&state)
        .transition(id, Transition::Cancel { reason: request.reason })
        .await?;
    Ok(Json(response))
}

async fn delete_work_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    controller(&state).delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Work item eliminado exitosamente"
    })))
}
