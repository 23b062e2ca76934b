use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request para mover un vehículo a otro step
#[derive(Debug, Deserialize)]
pub struct MoveVehicleRequest {
    pub step_id: Uuid,
}

/// Response del estado actual de un vehículo en el pipeline
#[derive(Debug, Serialize)]
pub struct VehicleStepStateResponse {
    pub vehicle_id: Uuid,
    pub step_id: Uuid,
    pub step_name: String,
    pub step_position: i32,
    pub entered_at: String,
    pub days_in_step: f64,
    pub bucket: String,
    pub sla_hours: i32,
    /// false en steps terminales: el dwell se muestra pero no alerta
    pub dwell_clock_active: bool,
    /// Work items abiertos que impiden dar el step por limpio
    pub blocking_work_items: i64,
    pub work_items_clear: bool,
}
