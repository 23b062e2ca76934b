//! Modelo de WorkItem
//! 
//! Tareas de reparación/aprobación asociadas a un vehículo. El status
//! persistido sigue la máquina de estados del lifecycle; awaiting_approval
//! es una proyección de display, nunca se persiste.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// WorkItem principal - mapea exactamente a la tabla work_items
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkItem {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub title: String,
    pub work_type: String,
    pub priority: i32,
    pub estimated_cost: Option<Decimal>,
    pub actual_cost: Option<Decimal>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub approval_required: bool,
    pub approval_status: Option<String>,
    pub status: String,
    pub status_reason: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_completion: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Status persistido del work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Pending,
    Scheduled,
    InProgress,
    OnHold,
    Blocked,
    Completed,
    Cancelled,
    Rejected,
}

impl WorkItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemStatus::Pending => "pending",
            WorkItemStatus::Scheduled => "scheduled",
            WorkItemStatus::InProgress => "in_progress",
            WorkItemStatus::OnHold => "on_hold",
            WorkItemStatus::Blocked => "blocked",
            WorkItemStatus::Completed => "completed",
            WorkItemStatus::Cancelled => "cancelled",
            WorkItemStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(WorkItemStatus::Pending),
            "scheduled" => Some(WorkItemStatus::Scheduled),
            "in_progress" => Some(WorkItemStatus::InProgress),
            "on_hold" => Some(WorkItemStatus::OnHold),
            "blocked" => Some(WorkItemStatus::Blocked),
            "completed" => Some(WorkItemStatus::Completed),
            "cancelled" => Some(WorkItemStatus::Cancelled),
            "rejected" => Some(WorkItemStatus::Rejected),
            _ => None,
        }
    }

    /// Estados terminales: sin más transiciones posibles (salvo delete)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkItemStatus::Completed | WorkItemStatus::Cancelled | WorkItemStatus::Rejected
        )
    }
}

/// Tipo de trabajo del work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    Mechanical,
    BodyRepair,
    Detailing,
    SafetyInspection,
    Reconditioning,
    PartsOrdering,
    Other,
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::Mechanical => "mechanical",
            WorkType::BodyRepair => "body_repair",
            WorkType::Detailing => "detailing",
            WorkType::SafetyInspection => "safety_inspection",
            WorkType::Reconditioning => "reconditioning",
            WorkType::PartsOrdering => "parts_ordering",
            WorkType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mechanical" => Some(WorkType::Mechanical),
            "body_repair" => Some(WorkType::BodyRepair),
            "detailing" => Some(WorkType::Detailing),
            "safety_inspection" => Some(WorkType::SafetyInspection),
            "reconditioning" => Some(WorkType::Reconditioning),
            "parts_ordering" => Some(WorkType::PartsOrdering),
            "other" => Some(WorkType::Other),
            _ => None,
        }
    }
}

/// Prioridades válidas: low=1, normal=2, high=3
pub const PRIORITY_LOW: i32 = 1;
pub const PRIORITY_NORMAL: i32 = 2;
pub const PRIORITY_HIGH: i32 = 3;

pub const APPROVAL_APPROVED: &str = "approved";
pub const APPROVAL_REJECTED: &str = "rejected";

impl WorkItem {
    /// Proyección de display: awaiting_approval se deriva, nunca se persiste.
    /// rejected tiene precedencia sobre cualquier estado derivado de aprobación.
    pub fn display_status(&self) -> &str {
        if self.status == "rejected" {
            return "rejected";
        }
        if self.status == "pending" && self.approval_required && self.approval_status.is_none() {
            return "awaiting_approval";
        }
        &self.status
    }

    /// El gate de aprobación está pendiente: no se puede arrancar trabajo
    pub fn awaiting_approval(&self) -> bool {
        self.approval_required && self.approval_status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_item() -> WorkItem {
        WorkItem {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            title: "Replace brake pads".to_string(),
            work_type: "mechanical".to_string(),
            priority: PRIORITY_NORMAL,
            estimated_cost: None,
            actual_cost: None,
            estimated_hours: None,
            actual_hours: None,
            approval_required: false,
            approval_status: None,
            status: "pending".to_string(),
            status_reason: None,
            vendor_id: None,
            technician_id: None,
            scheduled_for: None,
            created_at: Utc::now(),
            actual_start: None,
            actual_completion: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_status_derives_awaiting_approval() {
        let mut item = base_item();
        assert_eq!(item.display_status(), "pending");

        item.approval_required = true;
        assert_eq!(item.display_status(), "awaiting_approval");

        item.approval_status = Some(APPROVAL_APPROVED.to_string());
        assert_eq!(item.display_status(), "pending");
    }

    #[test]
    fn test_rejected_takes_precedence() {
        let mut item = base_item();
        item.approval_required = true;
        item.approval_status = Some(APPROVAL_REJECTED.to_string());
        item.status = "rejected".to_string();
        assert_eq!(item.display_status(), "rejected");
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            WorkItemStatus::Pending,
            WorkItemStatus::Scheduled,
            WorkItemStatus::InProgress,
            WorkItemStatus::OnHold,
            WorkItemStatus::Blocked,
            WorkItemStatus::Completed,
            WorkItemStatus::Cancelled,
            WorkItemStatus::Rejected,
        ] {
            assert_eq!(WorkItemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WorkItemStatus::parse("approved"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(WorkItemStatus::Completed.is_terminal());
        assert!(WorkItemStatus::Cancelled.is_terminal());
        assert!(WorkItemStatus::Rejected.is_terminal());
        assert!(!WorkItemStatus::Blocked.is_terminal());
        assert!(!WorkItemStatus::Pending.is_terminal());
    }

    #[test]
    fn test_work_type_parse() {
        assert_eq!(WorkType::parse("body_repair"), Some(WorkType::BodyRepair));
        assert_eq!(WorkType::parse("painting"), None);
    }
}
