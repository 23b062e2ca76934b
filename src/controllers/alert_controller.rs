use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::models::bottleneck::{BottleneckAlert, SlaStatus};
use crate::models::notification::DomainEvent;
use crate::repositories::step_repository::StepRepository;
use crate::repositories::vehicle_state_repository::VehicleStateRepository;
use crate::services::notification_service::NotificationDispatcher;
use crate::services::sla_service::{self, DetectorConfig};
use crate::utils::errors::AppError;

pub struct AlertController {
    step_repository: StepRepository,
    state_repository: VehicleStateRepository,
    dispatcher: NotificationDispatcher,
    detector_config: DetectorConfig,
}

impl AlertController {
    pub fn new(pool: PgPool, config: &EnvironmentConfig, http: reqwest::Client) -> Self {
        Self {
            step_repository: StepRepository::new(pool.clone()),
            state_repository: VehicleStateRepository::new(pool.clone()),
            dispatcher: NotificationDispatcher::new(pool, config, http),
            detector_config: config.detector_config(),
        }
    }

    /// Corrida del detector sobre todos los steps. Solo lectura y
    /// re-entrante: tolera que la progresión cambie entre lecturas.
    pub async fn compute_bottleneck_alerts(
        &self,
        notify: bool,
    ) -> Result<Vec<BottleneckAlert>, AppError> {
        let now = Utc::now();
        let steps = self.step_repository.list().await?;
        let mut alerts: Vec<BottleneckAlert> = Vec::new();

        for step in &steps {
            let open_states = self.state_repository.list_open_by_step(step.id).await?;
            if open_states.is_empty() {
                continue;
            }

            let completed = self
                .state_repository
                .completions_last_24h(step.id, now)
                .await?;

            alerts.extend(sla_service::alerts_for_step(
                step,
                &open_states,
                completed,
                now,
                &self.detector_config,
            ));
        }

        if notify {
            for alert in &alerts {
                let event = DomainEvent::BottleneckDetected {
                    step_id: alert.step_id,
                    step_name: alert.step_name.clone(),
                    severity: alert.severity.as_str().to_string(),
                };
                if let Err(e) = self.dispatcher.dispatch(&event).await {
                    warn!("⚠️ No se pudo despachar bottleneck_detected: {}", e);
                }
            }
        }

        Ok(alerts)
    }

    pub async fn sla_status(&self, step_id: Uuid) -> Result<SlaStatus, AppError> {
        let step = self
            .step_repository
            .find_by_id(step_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Step '{}' not found", step_id)))?;

        let open_states = self.state_repository.list_open_by_step(step.id).await?;
        Ok(sla_service::sla_status(
            &step,
            &open_states,
            Utc::now(),
            &self.detector_config,
        ))
    }
}
