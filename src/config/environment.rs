//! Configuración de variables de entorno
//! 
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Los cortes del detector son constantes configurables, no invariantes:
//! los defaults reflejan la convención actual del negocio.

use std::env;

use crate::services::sla_service::DetectorConfig;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    // Cortes del detector SLA/bottleneck
    pub severity_critical_ratio: f64,
    pub severity_high_ratio: f64,
    pub throughput_shortfall_high: f64,
    // Gateways externos de notificación (transporte opaco)
    pub email_relay_url: Option<String>,
    pub push_gateway_url: Option<String>,
    // Barrido de retención de notificaciones
    pub purge_interval_secs: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            severity_critical_ratio: env::var("SEVERITY_CRITICAL_RATIO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            severity_high_ratio: env::var("SEVERITY_HIGH_RATIO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.5),
            throughput_shortfall_high: env::var("THROUGHPUT_SHORTFALL_HIGH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.5),
            email_relay_url: env::var("NOTIFY_EMAIL_RELAY_URL").ok(),
            push_gateway_url: env::var("NOTIFY_PUSH_GATEWAY_URL").ok(),
            purge_interval_secs: env::var("NOTIFICATION_PURGE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Cortes del detector como config tipada
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            critical_overage_ratio: self.severity_critical_ratio,
            high_overage_ratio: self.severity_high_ratio,
            throughput_shortfall_high: self.throughput_shortfall_high,
        }
    }
}
