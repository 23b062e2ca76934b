//! Modelo de progresión de vehículos
//! 
//! Un vehículo ocupa exactamente un step a la vez: su estado abierto
//! (exited_at IS NULL) lleva el reloj de dwell. Al cerrar el estado se
//! congela el dwell acumulado en frozen_days.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Límites fijos de los day buckets, compartidos por todos los steps
pub const FRESH_MAX_DAYS: f64 = 1.0;
pub const CRITICAL_MIN_DAYS: f64 = 4.0;

/// Estado de un vehículo dentro de un step - mapea a vehicle_step_states
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleStepState {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub step_id: Uuid,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub frozen_days: Option<f64>,
}

/// Clasificación por antigüedad dentro del step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBucket {
    Fresh,
    Normal,
    Critical,
}

impl DayBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayBucket::Fresh => "fresh",
            DayBucket::Normal => "normal",
            DayBucket::Critical => "critical",
        }
    }
}

/// Días transcurridos entre dos instantes, redondeados hacia arriba a días enteros.
/// 50 horas en un step cuentan como 3 días.
pub fn days_between(entered_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (now - entered_at).num_seconds();
    if seconds <= 0 {
        return 0.0;
    }
    (seconds as f64 / 86_400.0).ceil()
}

/// Clasificar días-en-step en su bucket. Función pura, sin efectos.
pub fn classify_bucket(days_in_step: f64) -> DayBucket {
    if days_in_step <= FRESH_MAX_DAYS {
        DayBucket::Fresh
    } else if days_in_step < CRITICAL_MIN_DAYS {
        DayBucket::Normal
    } else {
        DayBucket::Critical
    }
}

impl VehicleStepState {
    /// Dwell del estado: congelado si el estado está cerrado, derivado si sigue abierto
    pub fn days_in_step(&self, now: DateTime<Utc>) -> f64 {
        match (self.exited_at, self.frozen_days) {
            (Some(_), Some(frozen)) => frozen,
            (Some(exited), None) => days_between(self.entered_at, exited),
            _ => days_between(self.entered_at, now),
        }
    }

    pub fn bucket(&self, now: DateTime<Utc>) -> DayBucket {
        classify_bucket(self.days_in_step(now))
    }

    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_classify_bucket_boundaries() {
        assert_eq!(classify_bucket(0.5), DayBucket::Fresh);
        assert_eq!(classify_bucket(1.0), DayBucket::Fresh);
        assert_eq!(classify_bucket(2.0), DayBucket::Normal);
        assert_eq!(classify_bucket(3.0), DayBucket::Normal);
        assert_eq!(classify_bucket(4.0), DayBucket::Critical);
        assert_eq!(classify_bucket(10.0), DayBucket::Critical);
    }

    #[test]
    fn test_days_between_rounds_up() {
        let entered = Utc::now();
        assert_eq!(days_between(entered, entered + Duration::hours(12)), 1.0);
        assert_eq!(days_between(entered, entered + Duration::hours(24)), 1.0);
        assert_eq!(days_between(entered, entered + Duration::hours(25)), 2.0);
        assert_eq!(days_between(entered, entered + Duration::hours(50)), 3.0);
        assert_eq!(days_between(entered, entered), 0.0);
    }

    #[test]
    fn test_frozen_days_take_precedence_when_closed() {
        let entered = Utc::now() - Duration::days(10);
        let state = VehicleStepState {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            step_id: Uuid::new_v4(),
            entered_at: entered,
            exited_at: Some(entered + Duration::days(2)),
            frozen_days: Some(2.0),
        };
        assert_eq!(state.days_in_step(Utc::now()), 2.0);
        assert!(!state.is_open());
    }

    #[test]
    fn test_open_state_keeps_counting() {
        let state = VehicleStepState {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            step_id: Uuid::new_v4(),
            entered_at: Utc::now() - Duration::hours(50),
            exited_at: None,
            frozen_days: None,
        };
        assert_eq!(state.days_in_step(Utc::now()), 3.0);
        assert_eq!(state.bucket(Utc::now()), DayBucket::Normal);
    }
}
