use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::dto::response::ApiResponse;
use crate::dto::vehicle_dto::VehicleStepStateResponse;
use crate::models::notification::DomainEvent;
use crate::repositories::step_repository::StepRepository;
use crate::repositories::vehicle_state_repository::VehicleStateRepository;
use crate::repositories::work_item_repository::WorkItemRepository;
use crate::services::notification_service::NotificationDispatcher;
use crate::utils::errors::AppError;

pub struct VehicleController {
    step_repository: StepRepository,
    state_repository: VehicleStateRepository,
    work_item_repository: WorkItemRepository,
    dispatcher: NotificationDispatcher,
}

impl VehicleController {
    pub fn new(pool: PgPool, config: &EnvironmentConfig, http: reqwest::Client) -> Self {
        Self {
            step_repository: StepRepository::new(pool.clone()),
            state_repository: VehicleStateRepository::new(pool.clone()),
            work_item_repository: WorkItemRepository::new(pool.clone()),
            dispatcher: NotificationDispatcher::new(pool, config, http),
        }
    }

    /// Mover un vehículo a otro step: cierra el estado previo (congelando
    /// su dwell) y abre el nuevo en una sola transacción. Los eventos de
    /// step se despachan después del commit; su fallo no revierte el move.
    pub async fn move_to_step(
        &self,
        vehicle_id: Uuid,
        step_id: Uuid,
    ) -> Result<ApiResponse<VehicleStepStateResponse>, AppError> {
        let destination = self
            .step_repository
            .find_by_id(step_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Step '{}' not found", step_id)))?;

        let now = Utc::now();
        let (closed, opened) = self
            .state_repository
            .move_to_step(vehicle_id, destination.id, now)
            .await?;

        if let Some(closed_state) = &closed {
            if let Ok(Some(prior_step)) = self.step_repository.find_by_id(closed_state.step_id).await {
                let completed = DomainEvent::StepCompleted {
                    vehicle_id,
                    step_id: prior_step.id,
                    step_name: prior_step.name.clone(),
                };
                if let Err(e) = self.dispatcher.dispatch(&completed).await {
                    warn!("⚠️ No se pudo despachar step_completed: {}", e);
                }
            }
        }

        let entered = DomainEvent::StepEntered {
            vehicle_id,
            step_id: destination.id,
            step_name: destination.name.clone(),
        };
        if let Err(e) = self.dispatcher.dispatch(&entered).await {
            warn!("⚠️ No se pudo despachar step_entered: {}", e);
        }

        let days = opened.days_in_step(now);
        let blocking = self.work_item_repository.count_open_blocking(vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            VehicleStepStateResponse {
                vehicle_id,
                step_id: destination.id,
                step_name: destination.name,
                step_position: destination.position,
                entered_at: opened.entered_at.to_rfc3339(),
                days_in_step: days,
                bucket: opened.bucket(now).as_str().to_string(),
                sla_hours: destination.sla_hours,
                dwell_clock_active: !destination.is_last_step,
                blocking_work_items: blocking,
                work_items_clear: blocking == 0,
            },
            "Vehículo movido exitosamente".to_string(),
        ))
    }

    pub async fn get_step_state(
        &self,
        vehicle_id: Uuid,
    ) -> Result<VehicleStepStateResponse, AppError> {
        let state = self
            .state_repository
            .find_open_by_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Vehicle '{}' is not in any reconditioning step",
                    vehicle_id
                ))
            })?;

        let step = self
            .step_repository
            .find_by_id(state.step_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Step '{}' not found", state.step_id)))?;

        let now = Utc::now();
        let blocking = self.work_item_repository.count_open_blocking(vehicle_id).await?;
        Ok(VehicleStepStateResponse {
            vehicle_id,
            step_id: step.id,
            step_name: step.name,
            step_position: step.position,
            entered_at: state.entered_at.to_rfc3339(),
            days_in_step: state.days_in_step(now),
            bucket: state.bucket(now).as_str().to_string(),
            sla_hours: step.sla_hours,
            dwell_clock_active: !step.is_last_step,
            blocking_work_items: blocking,
            work_items_clear: blocking == 0,
        })
    }
}
