//! Lifecycle de work items
//! 
//! Máquina de estados de las tareas de reparación/aprobación. apply() es
//! pura: computa el work item completo resultante sin tocar persistencia;
//! el controller lo persiste después con un UPDATE condicionado al status
//! leído. Ninguna transición es idempotente: repetirla falla con
//! InvalidTransition.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::work_item::{WorkItem, WorkItemStatus, APPROVAL_APPROVED, APPROVAL_REJECTED};
use crate::utils::errors::{internal_error, invalid_transition_error, missing_reason_error, AppError, AppResult};

/// Verbos de transición del lifecycle
#[derive(Debug, Clone)]
pub enum Transition {
    Approve,
    Decline { reason: Option<String> },
    Schedule { scheduled_for: Option<DateTime<Utc>> },
    Start,
    Pause { reason: Option<String> },
    Resume,
    Block { reason: Option<String> },
    Unblock,
    Complete {
        actual_cost: Option<Decimal>,
        actual_hours: Option<f64>,
    },
    Cancel { reason: Option<String> },
}

impl Transition {
    pub fn verb(&self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::Decline { .. } => "decline",
            Transition::Schedule { .. } => "schedule",
            Transition::Start => "start",
            Transition::Pause { .. } => "pause",
            Transition::Resume => "resume",
            Transition::Block { .. } => "block",
            Transition::Unblock => "unblock",
            Transition::Complete { .. } => "complete",
            Transition::Cancel { .. } => "cancel",
        }
    }
}

/// Aplicar una transición y devolver el work item completo resultante.
/// Falla con InvalidTransition si la precondición de status no se cumple
/// y con MissingReason si falta una justificación obligatoria.
pub fn apply(item: &WorkItem, transition: Transition, now: DateTime<Utc>) -> AppResult<WorkItem> {
    let status = parsed_status(item)?;
    let mut next = item.clone();
    next.updated_at = now;

    match transition {
        Transition::Approve => {
            if status != WorkItemStatus::Pending || item.approval_status.is_some() {
                return Err(invalid_transition_error("approve", item.display_status()));
            }
            // La aprobación solo levanta el gate de arranque, el status no cambia
            next.approval_status = Some(APPROVAL_APPROVED.to_string());
        }

        Transition::Decline { reason } => {
            let reason = require_reason(reason, "decline a work item")?;
            if status != WorkItemStatus::Pending || item.approval_status.is_some() {
                return Err(invalid_transition_error("decline", item.display_status()));
            }
            next.status = WorkItemStatus::Rejected.as_str().to_string();
            next.approval_status = Some(APPROVAL_REJECTED.to_string());
            next.status_reason = Some(reason);
        }

        Transition::Schedule { scheduled_for } => {
            if status != WorkItemStatus::Pending {
                return Err(invalid_transition_error("schedule", item.display_status()));
            }
            if item.awaiting_approval() {
                return Err(invalid_transition_error(
                    "schedule",
                    "awaiting_approval",
                ));
            }
            next.status = WorkItemStatus::Scheduled.as_str().to_string();
            next.scheduled_for = scheduled_for.or(Some(now));
        }

        Transition::Start => {
            if !matches!(status, WorkItemStatus::Pending | WorkItemStatus::Scheduled) {
                return Err(invalid_transition_error("start", item.display_status()));
            }
            if item.awaiting_approval() {
                return Err(invalid_transition_error("start", "awaiting_approval"));
            }
            next.status = WorkItemStatus::InProgress.as_str().to_string();
            next.actual_start = Some(now);
        }

        Transition::Pause { reason } => {
            if status != WorkItemStatus::InProgress {
                return Err(invalid_transition_error("pause", item.display_status()));
            }
            next.status = WorkItemStatus::OnHold.as_str().to_string();
            next.status_reason = reason.filter(|r| !r.trim().is_empty());
        }

        Transition::Resume => {
            if status != WorkItemStatus::OnHold {
                return Err(invalid_transition_error("resume", item.display_status()));
            }
            next.status = WorkItemStatus::InProgress.as_str().to_string();
            next.status_reason = None;
        }

        Transition::Block { reason } => {
            let reason = require_reason(reason, "block a work item")?;
            if status != WorkItemStatus::InProgress {
                return Err(invalid_transition_error("block", item.display_status()));
            }
            next.status = WorkItemStatus::Blocked.as_str().to_string();
            next.status_reason = Some(reason);
        }

        Transition::Unblock => {
            if status != WorkItemStatus::Blocked {
                return Err(invalid_transition_error("unblock", item.display_status()));
            }
            next.status = WorkItemStatus::InProgress.as_str().to_string();
            next.status_reason = None;
        }

        Transition::Complete {
            actual_cost,
            actual_hours,
        } => {
            if status != WorkItemStatus::InProgress {
                return Err(invalid_transition_error("complete", item.display_status()));
            }
            next.status = WorkItemStatus::Completed.as_str().to_string();
            next.actual_completion = Some(now);
            if let Some(cost) = actual_cost {
                next.actual_cost = Some(cost);
            }
            next.actual_hours = match (actual_hours, item.actual_start) {
                (Some(hours), _) => Some(hours),
                (None, Some(start)) => Some(elapsed_hours(start, now)),
                (None, None) => item.actual_hours,
            };
        }

        Transition::Cancel { reason } => {
            let reason = require_reason(reason, "cancel a work item")?;
            if status.is_terminal() {
                return Err(invalid_transition_error("cancel", item.display_status()));
            }
            next.status = WorkItemStatus::Cancelled.as_str().to_string();
            next.status_reason = Some(reason);
        }
    }

    Ok(next)
}

fn parsed_status(item: &WorkItem) -> AppResult<WorkItemStatus> {
    WorkItemStatus::parse(&item.status).ok_or_else(|| {
        internal_error(&format!(
            "Work item '{}' has unknown status '{}'",
            item.id, item.status
        ))
    })
}

fn require_reason(reason: Option<String>, action: &str) -> AppResult<String> {
    match reason {
        Some(r) if !r.trim().is_empty() => Ok(r.trim().to_string()),
        _ => Err(missing_reason_error(action)),
    }
}

/// Horas transcurridas redondeadas a 2 decimales
fn elapsed_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let hours = (end - start).num_seconds() as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::work_item::PRIORITY_NORMAL;
    use chrono::Duration;
    use uuid::Uuid;

    fn item_with_status(status: &str) -> WorkItem {
        WorkItem {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            title: "Windshield replacement".to_string(),
            work_type: "body_repair".to_string(),
            priority: PRIORITY_NORMAL,
            estimated_cost: None,
            actual_cost: None,
            estimated_hours: None,
            actual_hours: None,
            approval_required: false,
            approval_status: None,
            status: status.to_string(),
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
    fn test_decline_requires_reason() {
        let item = item_with_status("pending");
        let result = apply(&item, Transition::Decline { reason: Some("".to_string()) }, Utc::now());
        assert!(matches!(result, Err(AppError::MissingReason(_))));

        let result = apply(&item, Transition::Decline { reason: None }, Utc::now());
        assert!(matches!(result, Err(AppError::MissingReason(_))));
    }

    #[test]
    fn test_decline_rejects_and_blocks_start_permanently() {
        let mut item = item_with_status("pending");
        item.approval_required = true;

        let declined = apply(
            &item,
            Transition::Decline {
                reason: Some("parts unavailable".to_string()),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(declined.status, "rejected");
        assert_eq!(declined.display_status(), "rejected");
        assert_eq!(declined.status_reason.as_deref(), Some("parts unavailable"));

        let started = apply(&declined, Transition::Start, Utc::now());
        assert!(matches!(started, Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn test_start_on_completed_fails() {
        let item = item_with_status("completed");
        let result = apply(&item, Transition::Start, Utc::now());
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn test_start_gated_by_approval() {
        let mut item = item_with_status("pending");
        item.approval_required = true;

        let blocked = apply(&item, Transition::Start, Utc::now());
        assert!(matches!(blocked, Err(AppError::InvalidTransition(_))));

        let approved = apply(&item, Transition::Approve, Utc::now()).unwrap();
        // La aprobación no cambia el status persistido
        assert_eq!(approved.status, "pending");
        assert_eq!(approved.approval_status.as_deref(), Some("approved"));

        let started = apply(&approved, Transition::Start, Utc::now()).unwrap();
        assert_eq!(started.status, "in_progress");
        assert!(started.actual_start.is_some());
    }

    #[test]
    fn test_approve_twice_fails() {
        let mut item = item_with_status("pending");
        item.approval_required = true;

        let approved = apply(&item, Transition::Approve, Utc::now()).unwrap();
        let again = apply(&approved, Transition::Approve, Utc::now());
        assert!(matches!(again, Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn test_complete_computes_hours_from_actual_start() {
        let now = Utc::now();
        let mut item = item_with_status("in_progress");
        item.actual_start = Some(now - Duration::hours(2));

        let completed = apply(
            &item,
            Transition::Complete {
                actual_cost: Some(Decimal::new(25000, 2)),
                actual_hours: None,
            },
            now,
        )
        .unwrap();

        assert_eq!(completed.status, "completed");
        assert_eq!(completed.actual_hours, Some(2.00));
        assert!(completed.actual_completion.is_some());
    }

    #[test]
    fn test_complete_prefers_explicit_hours() {
        let now = Utc::now();
        let mut item = item_with_status("in_progress");
        item.actual_start = Some(now - Duration::hours(5));

        let completed = apply(
            &item,
            Transition::Complete {
                actual_cost: None,
                actual_hours: Some(3.5),
            },
            now,
        )
        .unwrap();
        assert_eq!(completed.actual_hours, Some(3.5));
    }

    #[test]
    fn test_pause_resume_and_block_unblock() {
        let item = item_with_status("in_progress");

        let paused = apply(&item, Transition::Pause { reason: None }, Utc::now()).unwrap();
        assert_eq!(paused.status, "on_hold");

        let resumed = apply(&paused, Transition::Resume, Utc::now()).unwrap();
        assert_eq!(resumed.status, "in_progress");

        let no_reason = apply(&resumed, Transition::Block { reason: None }, Utc::now());
        assert!(matches!(no_reason, Err(AppError::MissingReason(_))));

        let blocked = apply(
            &resumed,
            Transition::Block {
                reason: Some("waiting on parts".to_string()),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(blocked.status, "blocked");
        assert_eq!(blocked.status_reason.as_deref(), Some("waiting on parts"));

        let unblocked = apply(&blocked, Transition::Unblock, Utc::now()).unwrap();
        assert_eq!(unblocked.status, "in_progress");
        assert!(unblocked.status_reason.is_none());
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        let pending = item_with_status("pending");
        let cancelled = apply(
            &pending,
            Transition::Cancel {
                reason: Some("vehicle sold as-is".to_string()),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(cancelled.status, "cancelled");

        for terminal in ["completed", "rejected", "cancelled"] {
            let item = item_with_status(terminal);
            let result = apply(
                &item,
                Transition::Cancel {
                    reason: Some("too late".to_string()),
                },
                Utc::now(),
            );
            assert!(matches!(result, Err(AppError::InvalidTransition(_))));
        }

        let no_reason = apply(&pending, Transition::Cancel { reason: None }, Utc::now());
        assert!(matches!(no_reason, Err(AppError::MissingReason(_))));
    }

    #[test]
    fn test_transitions_are_not_idempotent() {
        let item = item_with_status("pending");
        let started = apply(&item, Transition::Start, Utc::now()).unwrap();
        let started_twice = apply(&started, Transition::Start, Utc::now());
        assert!(matches!(started_twice, Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn test_schedule_then_start() {
        let item = item_with_status("pending");
        let scheduled = apply(
            &item,
            Transition::Schedule {
                scheduled_for: Some(Utc::now() + Duration::days(1)),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(scheduled.status, "scheduled");
        assert!(scheduled.scheduled_for.is_some());

        let started = apply(&scheduled, Transition::Start, Utc::now()).unwrap();
        assert_eq!(started.status, "in_progress");
    }
}
