//! Modelos de notificaciones
//! 
//! Eventos de dominio que consume el dispatcher, el registro in-app
//! (autoritativo para el badge de no-leídas) y las preferencias por usuario.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Categorías de notificación configurables por usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    SlaWarning,
    SlaCritical,
    Approvals,
    Bottlenecks,
    VehicleStatus,
    WorkItems,
    StepCompletion,
    System,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::SlaWarning => "sla_warning",
            NotificationCategory::SlaCritical => "sla_critical",
            NotificationCategory::Approvals => "approvals",
            NotificationCategory::Bottlenecks => "bottlenecks",
            NotificationCategory::VehicleStatus => "vehicle_status",
            NotificationCategory::WorkItems => "work_items",
            NotificationCategory::StepCompletion => "step_completion",
            NotificationCategory::System => "system",
        }
    }
}

/// Canales de entrega disponibles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    InApp,
    Email,
    Sound,
    Desktop,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::InApp => "in_app",
            DeliveryChannel::Email => "email",
            DeliveryChannel::Sound => "sound",
            DeliveryChannel::Desktop => "desktop",
        }
    }
}

/// Eventos de dominio que alimentan el dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DomainEvent {
    StepEntered {
        vehicle_id: Uuid,
        step_id: Uuid,
        step_name: String,
    },
    StepCompleted {
        vehicle_id: Uuid,
        step_id: Uuid,
        step_name: String,
    },
    WorkItemTransitioned {
        work_item_id: Uuid,
        vehicle_id: Uuid,
        step_id: Option<Uuid>,
        title: String,
        transition: String,
        technician_id: Option<Uuid>,
        vendor_id: Option<Uuid>,
    },
    ApprovalRequested {
        work_item_id: Uuid,
        vehicle_id: Uuid,
        step_id: Option<Uuid>,
        title: String,
        technician_id: Option<Uuid>,
    },
    BottleneckDetected {
        step_id: Uuid,
        step_name: String,
        severity: String,
    },
    System {
        message: String,
    },
}

impl DomainEvent {
    /// Categoría de preferencia que gobierna el evento
    pub fn category(&self) -> NotificationCategory {
        match self {
            DomainEvent::StepEntered { .. } => NotificationCategory::VehicleStatus,
            DomainEvent::StepCompleted { .. } => NotificationCategory::StepCompletion,
            DomainEvent::WorkItemTransitioned { transition, .. } => match transition.as_str() {
                "approve" | "decline" => NotificationCategory::Approvals,
                _ => NotificationCategory::WorkItems,
            },
            DomainEvent::ApprovalRequested { .. } => NotificationCategory::Approvals,
            DomainEvent::BottleneckDetected { severity, .. } => match severity.as_str() {
                "critical" => NotificationCategory::SlaCritical,
                "high" => NotificationCategory::SlaWarning,
                _ => NotificationCategory::Bottlenecks,
            },
            DomainEvent::System { .. } => NotificationCategory::System,
        }
    }

    /// Prioridad del evento, usada para el registro in-app
    pub fn priority(&self) -> &'static str {
        match self {
            DomainEvent::BottleneckDetected { severity, .. } => match severity.as_str() {
                "critical" => "critical",
                "high" => "high",
                _ => "normal",
            },
            DomainEvent::ApprovalRequested { .. } => "high",
            DomainEvent::WorkItemTransitioned { transition, .. } => match transition.as_str() {
                "decline" | "block" => "high",
                _ => "normal",
            },
            _ => "normal",
        }
    }

    /// Step afectado, para resolver asignaciones
    pub fn step_id(&self) -> Option<Uuid> {
        match self {
            DomainEvent::StepEntered { step_id, .. } => Some(*step_id),
            DomainEvent::StepCompleted { step_id, .. } => Some(*step_id),
            DomainEvent::WorkItemTransitioned { step_id, .. } => *step_id,
            DomainEvent::ApprovalRequested { step_id, .. } => *step_id,
            DomainEvent::BottleneckDetected { step_id, .. } => Some(*step_id),
            DomainEvent::System { .. } => None,
        }
    }

    /// Usuarios directamente involucrados además de los asignados al step
    pub fn direct_user_ids(&self) -> Vec<Uuid> {
        match self {
            DomainEvent::WorkItemTransitioned {
                technician_id,
                vendor_id,
                ..
            } => technician_id.iter().chain(vendor_id.iter()).copied().collect(),
            DomainEvent::ApprovalRequested { technician_id, .. } => {
                technician_id.iter().copied().collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn title(&self) -> String {
        match self {
            DomainEvent::StepEntered { step_name, .. } => {
                format!("Vehicle entered step '{}'", step_name)
            }
            DomainEvent::StepCompleted { step_name, .. } => {
                format!("Vehicle cleared step '{}'", step_name)
            }
            DomainEvent::WorkItemTransitioned { title, transition, .. } => {
                format!("Work item '{}': {}", title, transition)
            }
            DomainEvent::ApprovalRequested { title, .. } => {
                format!("Approval requested: '{}'", title)
            }
            DomainEvent::BottleneckDetected {
                step_name, severity, ..
            } => format!("Bottleneck ({}) at step '{}'", severity, step_name),
            DomainEvent::System { .. } => "System notification".to_string(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            DomainEvent::StepEntered { vehicle_id, step_name, .. } => format!(
                "Vehicle {} entered reconditioning step '{}'",
                vehicle_id, step_name
            ),
            DomainEvent::StepCompleted { vehicle_id, step_name, .. } => format!(
                "Vehicle {} moved out of reconditioning step '{}'",
                vehicle_id, step_name
            ),
            DomainEvent::WorkItemTransitioned {
                vehicle_id,
                title,
                transition,
                ..
            } => format!(
                "Work item '{}' on vehicle {} transitioned: {}",
                title, vehicle_id, transition
            ),
            DomainEvent::ApprovalRequested { vehicle_id, title, .. } => format!(
                "Work item '{}' on vehicle {} is awaiting approval",
                title, vehicle_id
            ),
            DomainEvent::BottleneckDetected {
                step_name, severity, ..
            } => format!(
                "Step '{}' raised a {} severity bottleneck alert",
                step_name, severity
            ),
            DomainEvent::System { message } => message.clone(),
        }
    }
}

/// Registro in-app - mapea a la tabla notifications.
/// Es el único canal autoritativo para el contador de no-leídas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub priority: String,
    pub title: String,
    pub body: String,
    pub sound: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Preferencias por usuario - mapea a notification_preferences
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationPreference {
    pub user_id: Uuid,
    pub notify_sla_warning: bool,
    pub notify_sla_critical: bool,
    pub notify_approvals: bool,
    pub notify_bottlenecks: bool,
    pub notify_vehicle_status: bool,
    pub notify_work_items: bool,
    pub notify_step_completion: bool,
    pub notify_system: bool,
    pub channel_in_app: bool,
    pub channel_email: bool,
    pub channel_sound: bool,
    pub channel_desktop: bool,
    pub quiet_hours_start: Option<String>,
    pub quiet_hours_end: Option<String>,
    pub tz_offset_minutes: i32,
    pub auto_dismiss_read_days: i32,
    pub auto_dismiss_unread_days: i32,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    /// Preferencias por defecto cuando el usuario nunca configuró nada
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            notify_sla_warning: true,
            notify_sla_critical: true,
            notify_approvals: true,
            notify_bottlenecks: true,
            notify_vehicle_status: true,
            notify_work_items: true,
            notify_step_completion: true,
            notify_system: true,
            channel_in_app: true,
            channel_email: true,
            channel_sound: false,
            channel_desktop: false,
            quiet_hours_start: None,
            quiet_hours_end: None,
            tz_offset_minutes: 0,
            auto_dismiss_read_days: 7,
            auto_dismiss_unread_days: 30,
            updated_at: Utc::now(),
        }
    }

    pub fn category_enabled(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::SlaWarning => self.notify_sla_warning,
            NotificationCategory::SlaCritical => self.notify_sla_critical,
            NotificationCategory::Approvals => self.notify_approvals,
            NotificationCategory::Bottlenecks => self.notify_bottlenecks,
            NotificationCategory::VehicleStatus => self.notify_vehicle_status,
            NotificationCategory::WorkItems => self.notify_work_items,
            NotificationCategory::StepCompletion => self.notify_step_completion,
            NotificationCategory::System => self.notify_system,
        }
    }

    pub fn channel_enabled(&self, channel: DeliveryChannel) -> bool {
        match channel {
            DeliveryChannel::InApp => self.channel_in_app,
            DeliveryChannel::Email => self.channel_email,
            DeliveryChannel::Sound => self.channel_sound,
            DeliveryChannel::Desktop => self.channel_desktop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_category_mapping() {
        let step_id = Uuid::new_v4();
        let entered = DomainEvent::StepEntered {
            vehicle_id: Uuid::new_v4(),
            step_id,
            step_name: "Detailing".to_string(),
        };
        assert_eq!(entered.category(), NotificationCategory::VehicleStatus);
        assert_eq!(entered.step_id(), Some(step_id));

        let decline = DomainEvent::WorkItemTransitioned {
            work_item_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            step_id: None,
            title: "Brake pads".to_string(),
            transition: "decline".to_string(),
            technician_id: None,
            vendor_id: None,
        };
        assert_eq!(decline.category(), NotificationCategory::Approvals);

        let start = DomainEvent::WorkItemTransitioned {
            work_item_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            step_id: None,
            title: "Brake pads".to_string(),
            transition: "start".to_string(),
            technician_id: None,
            vendor_id: None,
        };
        assert_eq!(start.category(), NotificationCategory::WorkItems);
    }

    #[test]
    fn test_bottleneck_severity_maps_to_sla_categories() {
        let critical = DomainEvent::BottleneckDetected {
            step_id: Uuid::new_v4(),
            step_name: "Inspection".to_string(),
            severity: "critical".to_string(),
        };
        assert_eq!(critical.category(), NotificationCategory::SlaCritical);
        assert_eq!(critical.priority(), "critical");

        let high = DomainEvent::BottleneckDetected {
            step_id: Uuid::new_v4(),
            step_name: "Inspection".to_string(),
            severity: "high".to_string(),
        };
        assert_eq!(high.category(), NotificationCategory::SlaWarning);

        let medium = DomainEvent::BottleneckDetected {
            step_id: Uuid::new_v4(),
            step_name: "Inspection".to_string(),
            severity: "medium".to_string(),
        };
        assert_eq!(medium.category(), NotificationCategory::Bottlenecks);
    }

    #[test]
    fn test_direct_user_ids_includes_technician_and_vendor() {
        let tech = Uuid::new_v4();
        let vendor = Uuid::new_v4();
        let event = DomainEvent::WorkItemTransitioned {
            work_item_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            step_id: None,
            title: "Paint touch-up".to_string(),
            transition: "complete".to_string(),
            technician_id: Some(tech),
            vendor_id: Some(vendor),
        };
        assert_eq!(event.direct_user_ids(), vec![tech, vendor]);
    }

    #[test]
    fn test_preference_toggles() {
        let mut pref = NotificationPreference::defaults_for(Uuid::new_v4());
        assert!(pref.category_enabled(NotificationCategory::Approvals));
        assert!(pref.channel_enabled(DeliveryChannel::InApp));
        assert!(!pref.channel_enabled(DeliveryChannel::Sound));

        pref.notify_approvals = false;
        assert!(!pref.category_enabled(NotificationCategory::Approvals));
    }
}
