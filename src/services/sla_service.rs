//! Detector de SLA y bottlenecks
//! 
//! Cómputo batch de solo lectura sobre el registry de steps y el snapshot
//! de progresión. Re-entrante: puede correrse en cada poll de UI sin
//! efectos secundarios. Los cortes de severidad son constantes
//! configurables, no invariantes del negocio.

use chrono::{DateTime, Utc};

use crate::models::bottleneck::{AlertMetric, AlertSeverity, BottleneckAlert, SlaStatus};
use crate::models::step::Step;
use crate::models::vehicle_state::VehicleStepState;

/// Cortes configurables del detector
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// Overage ratio a partir del cual un dwell violation es critical
    pub critical_overage_ratio: f64,
    /// Overage ratio a partir del cual es high (debajo queda medium)
    pub high_overage_ratio: f64,
    /// Shortfall de throughput a partir del cual la alerta es high
    pub throughput_shortfall_high: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            critical_overage_ratio: 1.0,
            high_overage_ratio: 0.5,
            throughput_shortfall_high: 0.5,
        }
    }
}

/// Severidad de un dwell violation según su peor overage ratio
pub fn severity_for_overage(ratio: f64, config: &DetectorConfig) -> AlertSeverity {
    if ratio >= config.critical_overage_ratio {
        AlertSeverity::Critical
    } else if ratio >= config.high_overage_ratio {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    }
}

/// Overage ratios de los vehículos que violan el SLA del step.
/// Steps terminales no llevan reloj de SLA; sla_hours <= 0 se trata
/// como sin configurar.
fn overage_ratios(
    step: &Step,
    open_states: &[VehicleStepState],
    now: DateTime<Utc>,
) -> Vec<f64> {
    if !step.dwell_clock_active() || step.sla_hours <= 0 {
        return Vec::new();
    }

    let sla_hours = step.sla_hours as f64;
    open_states
        .iter()
        .filter(|state| state.step_id == step.id && state.is_open())
        .filter_map(|state| {
            let dwell_hours = state.days_in_step(now) * 24.0;
            if dwell_hours > sla_hours {
                Some((dwell_hours - sla_hours) / sla_hours)
            } else {
                None
            }
        })
        .collect()
}

/// Alerta de dwell del step, si al menos un vehículo viola el SLA
pub fn dwell_alert(
    step: &Step,
    open_states: &[VehicleStepState],
    now: DateTime<Utc>,
    config: &DetectorConfig,
) -> Option<BottleneckAlert> {
    let ratios = overage_ratios(step, open_states, now);
    if ratios.is_empty() {
        return None;
    }

    let worst = ratios.iter().cloned().fold(0.0_f64, f64::max);
    Some(BottleneckAlert {
        step_id: step.id,
        step_name: step.name.clone(),
        severity: severity_for_overage(worst, config),
        metric: AlertMetric::DwellViolation {
            vehicles_over_sla: ratios.len(),
            worst_overage_ratio: (worst * 100.0).round() / 100.0,
            sla_hours: step.sla_hours,
        },
    })
}

/// Alerta de throughput del step: salidas reales en 24h vs target diario
pub fn throughput_alert(
    step: &Step,
    completed_last_24h: i64,
    config: &DetectorConfig,
) -> Option<BottleneckAlert> {
    if step.target_throughput <= 0 {
        return None;
    }

    let target = step.target_throughput as f64;
    let actual = completed_last_24h.max(0) as f64;
    if actual >= target {
        return None;
    }

    let shortfall = (target - actual) / target;
    let severity = if shortfall >= config.throughput_shortfall_high {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    };

    Some(BottleneckAlert {
        step_id: step.id,
        step_name: step.name.clone(),
        severity,
        metric: AlertMetric::ThroughputShortfall {
            completed_last_24h,
            target_per_day: step.target_throughput,
            shortfall_ratio: (shortfall * 100.0).round() / 100.0,
        },
    })
}

/// Alertas de un step: dwell y throughput se reportan como entradas
/// separadas, nunca se mezclan.
pub fn alerts_for_step(
    step: &Step,
    open_states: &[VehicleStepState],
    completed_last_24h: i64,
    now: DateTime<Utc>,
    config: &DetectorConfig,
) -> Vec<BottleneckAlert> {
    // Un step sin vehículos no emite alertas
    if !open_states.iter().any(|s| s.step_id == step.id && s.is_open()) {
        return Vec::new();
    }

    let mut alerts = Vec::new();
    if let Some(alert) = dwell_alert(step, open_states, now, config) {
        alerts.push(alert);
    }
    if let Some(alert) = throughput_alert(step, completed_last_24h, config) {
        alerts.push(alert);
    }
    alerts
}

/// Semáforo SLA del step: green sin violaciones, yellow con violaciones
/// por debajo del corte critical, red al alcanzarlo
pub fn sla_status(
    step: &Step,
    open_states: &[VehicleStepState],
    now: DateTime<Utc>,
    config: &DetectorConfig,
) -> SlaStatus {
    let ratios = overage_ratios(step, open_states, now);
    if ratios.is_empty() {
        return SlaStatus::Green;
    }

    let worst = ratios.iter().cloned().fold(0.0_f64, f64::max);
    if worst >= config.critical_overage_ratio {
        SlaStatus::Red
    } else {
        SlaStatus::Yellow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle_state::classify_bucket;
    use crate::models::vehicle_state::DayBucket;
    use crate::services::lifecycle_service::{apply, Transition};
    use chrono::Duration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn step_named(name: &str, sla_hours: i32, target_throughput: i32) -> Step {
        Step {
            id: Uuid::new_v4(),
            position: 1,
            name: name.to_string(),
            color: None,
            icon: None,
            sla_hours,
            cost_per_day: Decimal::ZERO,
            is_last_step: false,
            target_throughput,
            bottleneck_threshold_hours: 0,
            parallel_capable: false,
            express_lane_eligible: false,
            show_in_sidebar: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn open_state(step_id: Uuid, entered_hours_ago: i64, now: DateTime<Utc>) -> VehicleStepState {
        VehicleStepState {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            step_id,
            entered_at: now - Duration::hours(entered_hours_ago),
            exited_at: None,
            frozen_days: None,
        }
    }

    #[test]
    fn test_severity_scaling() {
        let config = DetectorConfig::default();
        assert_eq!(severity_for_overage(0.1, &config), AlertSeverity::Medium);
        assert_eq!(severity_for_overage(0.5, &config), AlertSeverity::High);
        assert_eq!(severity_for_overage(0.99, &config), AlertSeverity::High);
        assert_eq!(severity_for_overage(1.0, &config), AlertSeverity::Critical);
        assert_eq!(severity_for_overage(2.5, &config), AlertSeverity::Critical);
    }

    #[test]
    fn test_dwell_violation_at_double_sla_is_critical() {
        // sla 24h, vehículo con days_in_step = 2 (48h) -> ratio 1.0 -> critical
        let now = Utc::now();
        let step = step_named("Inspection", 24, 0);
        let states = vec![open_state(step.id, 48, now)];

        let alert = dwell_alert(&step, &states, now, &DetectorConfig::default()).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
        match alert.metric {
            AlertMetric::DwellViolation {
                vehicles_over_sla,
                worst_overage_ratio,
                sla_hours,
            } => {
                assert_eq!(vehicles_over_sla, 1);
                assert_eq!(sla_hours, 24);
                assert!((worst_overage_ratio - 1.0).abs() < f64::EPSILON);
            }
            _ => panic!("expected dwell violation metric"),
        }
    }

    #[test]
    fn test_no_violations_no_alert() {
        let now = Utc::now();
        let step = step_named("Detailing", 72, 0);
        let states = vec![open_state(step.id, 20, now)];
        assert!(dwell_alert(&step, &states, now, &DetectorConfig::default()).is_none());
    }

    #[test]
    fn test_terminal_step_excluded_from_dwell_alerting() {
        let now = Utc::now();
        let mut step = step_named("Ready for sale", 24, 0);
        step.is_last_step = true;
        let states = vec![open_state(step.id, 200, now)];

        assert!(dwell_alert(&step, &states, now, &DetectorConfig::default()).is_none());
        assert_eq!(
            sla_status(&step, &states, now, &DetectorConfig::default()),
            SlaStatus::Green
        );
    }

    #[test]
    fn test_throughput_shortfall_severity() {
        let config = DetectorConfig::default();
        let step = step_named("Mechanical", 24, 10);

        // 2 de 10 -> shortfall 0.8 -> high
        let alert = throughput_alert(&step, 2, &config).unwrap();
        assert_eq!(alert.severity, AlertSeverity::High);

        // 8 de 10 -> shortfall 0.2 -> medium
        let alert = throughput_alert(&step, 8, &config).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Medium);

        // Target cumplido -> sin alerta
        assert!(throughput_alert(&step, 10, &config).is_none());

        // Sin target configurado -> sin alerta
        let no_target = step_named("Mechanical", 24, 0);
        assert!(throughput_alert(&no_target, 0, &config).is_none());
    }

    #[test]
    fn test_step_can_carry_both_alerts_as_distinct_entries() {
        let now = Utc::now();
        let step = step_named("Body shop", 24, 5);
        let states = vec![open_state(step.id, 60, now)];

        let alerts = alerts_for_step(&step, &states, 1, now, &DetectorConfig::default());
        assert_eq!(alerts.len(), 2);
        assert!(matches!(alerts[0].metric, AlertMetric::DwellViolation { .. }));
        assert!(matches!(alerts[1].metric, AlertMetric::ThroughputShortfall { .. }));
        assert!(alerts.iter().all(|a| a.step_id == step.id));
    }

    #[test]
    fn test_empty_step_emits_nothing() {
        let now = Utc::now();
        let step = step_named("Empty", 24, 5);
        let alerts = alerts_for_step(&step, &[], 0, now, &DetectorConfig::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_sla_status_traffic_light() {
        let now = Utc::now();
        let config = DetectorConfig::default();
        let step = step_named("Inspection", 24, 0);

        assert_eq!(sla_status(&step, &[], now, &config), SlaStatus::Green);

        // 25h -> ceil a 2 días -> 48h -> ratio 1.0 -> red
        let red = vec![open_state(step.id, 25, now)];
        assert_eq!(sla_status(&step, &red, now, &config), SlaStatus::Red);

        // sla 72h, 4 días (96h) -> ratio 0.33 -> yellow
        let wide = step_named("Paint", 72, 0);
        let yellow = vec![open_state(wide.id, 96, now)];
        assert_eq!(sla_status(&wide, &yellow, now, &config), SlaStatus::Yellow);
    }

    /// Flujo completo sobre la capa pura: step con SLA de 24h, vehículo
    /// 50h adentro, alerta critical; work item que requiere aprobación,
    /// declinado con razón, ya no puede arrancar.
    #[test]
    fn test_pipeline_end_to_end() {
        let now = Utc::now();
        let config = DetectorConfig::default();
        let step = step_named("Inspection", 24, 0);

        let vehicle_state = open_state(step.id, 50, now);
        assert_eq!(vehicle_state.days_in_step(now), 3.0);
        assert_eq!(classify_bucket(vehicle_state.days_in_step(now)), DayBucket::Normal);

        let alerts = alerts_for_step(&step, &[vehicle_state], 0, now, &config);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].step_name, "Inspection");

        let mut item = crate::models::work_item::WorkItem {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            title: "Frame inspection".to_string(),
            work_type: "safety_inspection".to_string(),
            priority: 2,
            estimated_cost: None,
            actual_cost: None,
            estimated_hours: None,
            actual_hours: None,
            approval_required: true,
            approval_status: None,
            status: "pending".to_string(),
            status_reason: None,
            vendor_id: None,
            technician_id: None,
            scheduled_for: None,
            created_at: now,
            actual_start: None,
            actual_completion: None,
            updated_at: now,
        };
        assert_eq!(item.display_status(), "awaiting_approval");

        item = apply(
            &item,
            Transition::Decline {
                reason: Some("structural damage out of budget".to_string()),
            },
            now,
        )
        .unwrap();
        assert_eq!(item.status, "rejected");

        let started = apply(&item, Transition::Start, now);
        assert!(matches!(
            started,
            Err(crate::utils::errors::AppError::InvalidTransition(_))
        ));
    }
}
