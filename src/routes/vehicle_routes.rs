use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::response::ApiResponse;
use crate::dto::vehicle_dto::{MoveVehicleRequest, VehicleStepStateResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/:vehicle_id/move", post(move_vehicle))
        .route("/:vehicle_id/step-state", get(get_step_state))
}

async fn move_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
    Json(request): Json<MoveVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleStepStateResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone(), &state.config, state.http_client.clone());
    let response = controller.move_to_step(vehicle_id, request.step_id).await?;
    Ok(Json(response))
}

async fn get_step_state(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<VehicleStepStateResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone(), &state.config, state.http_client.clone());
    let response = controller.get_step_state(vehicle_id).await?;
    Ok(Json(response))
}
