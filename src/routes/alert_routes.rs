use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::controllers::alert_controller::AlertController;
use crate::models::bottleneck::BottleneckAlert;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_alert_router() -> Router<AppState> {
    Router::new()
        .route("/bottlenecks", get(compute_bottlenecks))
        .route("/sla-status/:step_id", get(sla_status))
}

#[derive(Debug, Deserialize)]
struct BottleneckQuery {
    /// true para además despachar notificaciones por cada alerta
    notify: Option<bool>,
}

async fn compute_bottlenecks(
    State(state): State<AppState>,
    Query(query): Query<BottleneckQuery>,
) -> Result<Json<Vec<BottleneckAlert>>, AppError> {
    let controller = AlertController::new(state.pool.clone(), &state.config, state.http_client.clone());
    let alerts = controller
        .compute_bottleneck_alerts(query.notify.unwrap_or(false))
        .await?;
    Ok(Json(alerts))
}

async fn sla_status(
    State(state): State<AppState>,
    Path(step_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = AlertController::new(state.pool.clone(), &state.config, state.http_client.clone());
    let status = controller.sla_status(step_id).await?;
    Ok(Json(serde_json::json!({
        "step_id": step_id,
        "sla_status": status.as_str(),
    })))
}
