use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::work_item::WorkItem;

/// Request para crear un work item
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkItemRequest {
    pub vehicle_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    pub work_type: String,

    #[validate(range(min = 1, max = 3))]
    pub priority: Option<i32>,

    pub estimated_cost: Option<Decimal>,
    pub estimated_hours: Option<f64>,

    #[serde(default)]
    pub approval_required: bool,

    pub vendor_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
}

/// Request para edición simple de campos (sin transiciones de estado)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWorkItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub work_type: Option<String>,

    #[validate(range(min = 1, max = 3))]
    pub priority: Option<i32>,

    pub estimated_cost: Option<Decimal>,
    pub estimated_hours: Option<f64>,
    pub vendor_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
}

/// Request con justificación para decline/pause/block/cancel.
/// La obligatoriedad depende del verbo y se valida en el lifecycle.
#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

/// Request para agendar el arranque de un work item
#[derive(Debug, Deserialize)]
pub struct ScheduleWorkItemRequest {
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Request para completar un work item
#[derive(Debug, Default, Deserialize)]
pub struct CompleteWorkItemRequest {
    pub actual_cost: Option<Decimal>,
    pub actual_hours: Option<f64>,
}

/// Response de work item para la API
#[derive(Debug, Serialize)]
pub struct WorkItemResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub title: String,
    pub work_type: String,
    pub priority: i32,
    pub estimated_cost: Option<String>,
    pub actual_cost: Option<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub approval_required: bool,
    pub approval_status: Option<String>,
    pub status: String,
    /// Proyección derivada: awaiting_approval cuando aplica
    pub display_status: String,
    pub status_reason: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub scheduled_for: Option<String>,
    pub created_at: String,
    pub actual_start: Option<String>,
    pub actual_completion: Option<String>,
    pub updated_at: String,
}

impl From<WorkItem> for WorkItemResponse {
    fn from(item: WorkItem) -> Self {
        let display_status = item.display_status().to_string();
        Self {
            id: item.id,
            vehicle_id: item.vehicle_id,
            title: item.title,
            work_type: item.work_type,
            priority: item.priority,
            estimated_cost: item.estimated_cost.map(|c| c.to_string()),
            actual_cost: item.actual_cost.map(|c| c.to_string()),
            estimated_hours: item.estimated_hours,
            actual_hours: item.actual_hours,
            approval_required: item.approval_required,
            approval_status: item.approval_status,
            status: item.status,
            display_status,
            status_reason: item.status_reason,
            vendor_id: item.vendor_id,
            technician_id: item.technician_id,
            scheduled_for: item.scheduled_for.map(|d| d.to_rfc3339()),
            created_at: item.created_at.to_rfc3339(),
            actual_start: item.actual_start.map(|d| d.to_rfc3339()),
            actual_completion: item.actual_completion.map(|d| d.to_rfc3339()),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}
