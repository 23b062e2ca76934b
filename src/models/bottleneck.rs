//! Modelos derivados del detector SLA/bottleneck
//! 
//! Las alertas son efímeras: se recomputan bajo demanda a partir del
//! registry de steps y el snapshot de progresión, nunca se persisten.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severidad de una alerta de bottleneck
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// Métrica que disparó la alerta
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertMetric {
    /// Vehículos cuyo dwell excede el SLA del step
    DwellViolation {
        vehicles_over_sla: usize,
        worst_overage_ratio: f64,
        sla_hours: i32,
    },
    /// Salidas del step en las últimas 24h por debajo del target
    ThroughputShortfall {
        completed_last_24h: i64,
        target_per_day: i32,
        shortfall_ratio: f64,
    },
}

/// Alerta de bottleneck por step. Un step puede llevar a la vez una alerta
/// de dwell y una de throughput como entradas separadas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckAlert {
    pub step_id: Uuid,
    pub step_name: String,
    pub severity: AlertSeverity,
    pub metric: AlertMetric,
}

/// Semáforo SLA de un step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlaStatus {
    Green,
    Yellow,
    Red,
}

impl SlaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaStatus::Green => "green",
            SlaStatus::Yellow => "yellow",
            SlaStatus::Red => "red",
        }
    }
}
