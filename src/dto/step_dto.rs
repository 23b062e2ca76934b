use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::step::Step;

/// Request para crear un nuevo step del pipeline
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStepRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 20))]
    pub color: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub icon: Option<String>,

    #[validate(range(min = 1, max = 8760))]
    pub sla_hours: i32,

    pub cost_per_day: Option<Decimal>,

    #[serde(default)]
    pub is_last_step: bool,

    #[validate(range(min = 0, max = 1000))]
    pub target_throughput: Option<i32>,

    #[validate(range(min = 0, max = 8760))]
    pub bottleneck_threshold_hours: Option<i32>,

    #[serde(default)]
    pub parallel_capable: bool,

    #[serde(default)]
    pub express_lane_eligible: bool,

    pub show_in_sidebar: Option<bool>,
}

/// Request para actualizar un step existente
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStepRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 20))]
    pub color: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub icon: Option<String>,

    #[validate(range(min = 1, max = 8760))]
    pub sla_hours: Option<i32>,

    pub cost_per_day: Option<Decimal>,

    pub is_last_step: Option<bool>,

    #[validate(range(min = 0, max = 1000))]
    pub target_throughput: Option<i32>,

    #[validate(range(min = 0, max = 8760))]
    pub bottleneck_threshold_hours: Option<i32>,

    pub parallel_capable: Option<bool>,
    pub express_lane_eligible: Option<bool>,
    pub show_in_sidebar: Option<bool>,
}

/// Request para reordenar el pipeline completo.
/// expected_revision permite detectar reorders concurrentes.
#[derive(Debug, Deserialize)]
pub struct ReorderStepsRequest {
    pub ordered_ids: Vec<Uuid>,
    pub expected_revision: Option<i64>,
}

/// Request replace-all de asignaciones de un step
#[derive(Debug, Deserialize, Validate)]
pub struct AssignUsersRequest {
    pub user_ids: Vec<Uuid>,

    #[validate(length(min = 1, max = 50))]
    pub role: String,
}

/// Response de step para la API
#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub id: Uuid,
    pub position: i32,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sla_hours: i32,
    pub cost_per_day: String,
    pub is_last_step: bool,
    pub target_throughput: i32,
    pub bottleneck_threshold_hours: i32,
    pub parallel_capable: bool,
    pub express_lane_eligible: bool,
    pub show_in_sidebar: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Step> for StepResponse {
    fn from(step: Step) -> Self {
        Self {
            id: step.id,
            position: step.position,
            name: step.name,
            color: step.color,
            icon: step.icon,
            sla_hours: step.sla_hours,
            cost_per_day: step.cost_per_day.to_string(),
            is_last_step: step.is_last_step,
            target_throughput: step.target_throughput,
            bottleneck_threshold_hours: step.bottleneck_threshold_hours,
            parallel_capable: step.parallel_capable,
            express_lane_eligible: step.express_lane_eligible,
            show_in_sidebar: step.show_in_sidebar,
            created_at: step.created_at.to_rfc3339(),
            updated_at: step.updated_at.to_rfc3339(),
        }
    }
}

/// Response del pipeline completo con su revisión actual
#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub revision: i64,
    pub steps: Vec<StepResponse>,
}

/// Response de asignaciones de un step
#[derive(Debug, Serialize)]
pub struct StepAssignmentsResponse {
    pub step_id: Uuid,
    pub role: String,
    pub user_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}
