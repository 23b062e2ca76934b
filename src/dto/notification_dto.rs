use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request para actualizar preferencias de notificación (patch parcial)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePreferencesRequest {
    pub notify_sla_warning: Option<bool>,
    pub notify_sla_critical: Option<bool>,
    pub notify_approvals: Option<bool>,
    pub notify_bottlenecks: Option<bool>,
    pub notify_vehicle_status: Option<bool>,
    pub notify_work_items: Option<bool>,
    pub notify_step_completion: Option<bool>,
    pub notify_system: Option<bool>,

    pub channel_in_app: Option<bool>,
    pub channel_email: Option<bool>,
    pub channel_sound: Option<bool>,
    pub channel_desktop: Option<bool>,

    /// Ventana HH:MM - puede cruzar medianoche (start > end)
    pub quiet_hours_start: Option<String>,
    pub quiet_hours_end: Option<String>,

    /// Offset en minutos de la referencia local del usuario (UTC-14..UTC+14)
    pub tz_offset_minutes: Option<i32>,

    #[validate(range(min = 1, max = 365))]
    pub auto_dismiss_read_days: Option<i32>,

    #[validate(range(min = 1, max = 365))]
    pub auto_dismiss_unread_days: Option<i32>,
}

/// Resultado de despachar un evento por un canal a un usuario
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub user_id: Uuid,
    pub channel: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Resumen del fan-out de un evento de dominio
#[derive(Debug, Serialize)]
pub struct DispatchSummaryResponse {
    pub category: String,
    pub targets: usize,
    pub deliveries: Vec<DeliveryOutcome>,
}

/// Response del badge de no-leídas
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub user_id: Uuid,
    pub unread: i64,
}
