//! Modelo de Step
//! 
//! Este módulo contiene el struct Step del pipeline de reacondicionamiento
//! y las reglas puras sobre el invariante de posiciones (1..N, densas).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Step principal - mapea exactamente a la tabla recon_steps
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Step {
    pub id: Uuid,
    pub position: i32,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sla_hours: i32,
    pub cost_per_day: Decimal,
    pub is_last_step: bool,
    pub target_throughput: i32,
    pub bottleneck_threshold_hours: i32,
    pub parallel_capable: bool,
    pub express_lane_eligible: bool,
    pub show_in_sidebar: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Step {
    /// Un step terminal detiene el reloj de dwell para alertas SLA.
    /// El tiempo en step se sigue calculando para display.
    pub fn dwell_clock_active(&self) -> bool {
        !self.is_last_step
    }
}

/// Asignación de usuarios a un step (notificados al entrar un vehículo)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepAssignment {
    pub step_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Verificar que las posiciones formen exactamente 1..N sin huecos ni duplicados
pub fn positions_are_dense(steps: &[Step]) -> bool {
    let mut positions: Vec<i32> = steps.iter().map(|s| s.position).collect();
    positions.sort_unstable();
    positions
        .iter()
        .enumerate()
        .all(|(idx, pos)| *pos == (idx as i32) + 1)
}

/// Validar que la lista propuesta sea una permutación exacta de los steps actuales.
/// Un reorder parcial o con ids desconocidos rompería el invariante de ordinales.
pub fn validate_reorder(current_ids: &[Uuid], proposed_ids: &[Uuid]) -> AppResult<()> {
    if proposed_ids.is_empty() {
        return Err(AppError::BadRequest(
            "La lista de reorder no puede estar vacía".to_string(),
        ));
    }

    if current_ids.len() != proposed_ids.len() {
        return Err(AppError::OrdinalConflict(format!(
            "Reorder must include all {} steps, got {}",
            current_ids.len(),
            proposed_ids.len()
        )));
    }

    let mut seen: Vec<Uuid> = Vec::with_capacity(proposed_ids.len());
    for id in proposed_ids {
        if seen.contains(id) {
            return Err(AppError::OrdinalConflict(format!(
                "Duplicate step id '{}' in reorder list",
                id
            )));
        }
        if !current_ids.contains(id) {
            return Err(AppError::OrdinalConflict(format!(
                "Unknown step id '{}' in reorder list",
                id
            )));
        }
        seen.push(*id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_with_position(position: i32) -> Step {
        Step {
            id: Uuid::new_v4(),
            position,
            name: format!("Step {}", position),
            color: None,
            icon: None,
            sla_hours: 24,
            cost_per_day: Decimal::ZERO,
            is_last_step: false,
            target_throughput: 0,
            bottleneck_threshold_hours: 0,
            parallel_capable: false,
            express_lane_eligible: false,
            show_in_sidebar: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_positions_are_dense() {
        let steps = vec![step_with_position(2), step_with_position(1), step_with_position(3)];
        assert!(positions_are_dense(&steps));

        let with_gap = vec![step_with_position(1), step_with_position(3)];
        assert!(!positions_are_dense(&with_gap));

        let with_duplicate = vec![step_with_position(1), step_with_position(1)];
        assert!(!positions_are_dense(&with_duplicate));

        assert!(positions_are_dense(&[]));
    }

    #[test]
    fn test_validate_reorder_accepts_permutation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert!(validate_reorder(&[a, b, c], &[c, a, b]).is_ok());
    }

    #[test]
    fn test_validate_reorder_rejects_partial_list() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let result = validate_reorder(&[a, b], &[a]);
        assert!(matches!(result, Err(AppError::OrdinalConflict(_))));
    }

    #[test]
    fn test_validate_reorder_rejects_duplicates_and_unknown_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let duplicated = validate_reorder(&[a, b], &[a, a]);
        assert!(matches!(duplicated, Err(AppError::OrdinalConflict(_))));

        let unknown = validate_reorder(&[a, b], &[a, Uuid::new_v4()]);
        assert!(matches!(unknown, Err(AppError::OrdinalConflict(_))));
    }
}
