use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::notification_controller::NotificationController;
use crate::dto::notification_dto::{
    DispatchSummaryResponse, UnreadCountResponse, UpdatePreferencesRequest,
};
use crate::dto::response::ApiResponse;
use crate::models::notification::{DomainEvent, NotificationPreference};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_notification_router() -> Router<AppState> {
    Router::new()
        .route("/dispatch", post(dispatch_event))
        .route("/preferences/:user_id", get(get_preferences))
        .route("/preferences/:user_id", put(update_preferences))
        .route("/unread-count/:user_id", get(unread_count))
        .route("/read/:id", post(mark_read))
}

fn controller(state: &AppState) -> NotificationController {
    NotificationController::new(state.pool.clone(), &state.config, state.http_client.clone())
}

async fn dispatch_event(
    State(state): State<AppState>,
    Json(event): Json<DomainEvent>,
) -> Result<Json<ApiResponse<DispatchSummaryResponse>>, AppError> {
    let response = controller(&state).dispatch(event).await?;
    Ok(Json(response))
}

async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<NotificationPreference>, AppError> {
    let response = controller(&state).get_preferences(user_id).await?;
    Ok(Json(response))
}

async fn update_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> Result<Json<ApiResponse<NotificationPreference>>, AppError> {
    let response = controller(&state).update_preferences(user_id, request).await?;
    Ok(Json(response))
}

async fn unread_count(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let response = controller(&state).unread_count(user_id).await?;
    Ok(Json(response))
}

async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    controller(&state).mark_read(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Notificación marcada como leída"
    })))
}
