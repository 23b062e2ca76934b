use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::config::environment::EnvironmentConfig;
use crate::dto::response::ApiResponse;
use crate::dto::work_item_dto::{CreateWorkItemRequest, UpdateWorkItemRequest, WorkItemResponse};
use crate::models::notification::DomainEvent;
use crate::models::work_item::{WorkType, PRIORITY_NORMAL};
use crate::repositories::vehicle_state_repository::VehicleStateRepository;
use crate::repositories::work_item_repository::WorkItemRepository;
use crate::services::lifecycle_service::{self, Transition};
use crate::services::notification_service::NotificationDispatcher;
use crate::utils::errors::{not_found_error, AppError};

pub struct WorkItemController {
    repository: WorkItemRepository,
    state_repository: VehicleStateRepository,
    dispatcher: NotificationDispatcher,
}

impl WorkItemController {
    pub fn new(pool: PgPool, config: &EnvironmentConfig, http: reqwest::Client) -> Self {
        Self {
            repository: WorkItemRepository::new(pool.clone()),
            state_repository: VehicleStateRepository::new(pool.clone()),
            dispatcher: NotificationDispatcher::new(pool, config, http),
        }
    }

    pub async fn create(
        &self,
        request: CreateWorkItemRequest,
    ) -> Result<ApiResponse<WorkItemResponse>, AppError> {
        request.validate()?;

        if WorkType::parse(&request.work_type).is_none() {
            return Err(AppError::BadRequest(format!(
                "Unknown work_type '{}'",
                request.work_type
            )));
        }

        let item = self
            .repository
            .create(
                request.vehicle_id,
                request.title.trim().to_string(),
                request.work_type,
                request.priority.unwrap_or(PRIORITY_NORMAL),
                request.estimated_cost,
                request.estimated_hours,
                request.approval_required,
                request.vendor_id,
                request.technician_id,
            )
            .await?;

        if item.approval_required {
            let step_id = self.current_step_of(item.vehicle_id).await;
            let event = DomainEvent::ApprovalRequested {
                work_item_id: item.id,
                vehicle_id: item.vehicle_id,
                step_id,
                title: item.title.clone(),
                technician_id: item.technician_id,
            };
            if let Err(e) = self.dispatcher.dispatch(&event).await {
                warn!("⚠️ No se pudo despachar approval_requested: {}", e);
            }
        }

        Ok(ApiResponse::success_with_message(
            WorkItemResponse::from(item),
            "Work item creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<WorkItemResponse, AppError> {
        let item = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Work item", &id.to_string()))?;

        Ok(WorkItemResponse::from(item))
    }

    pub async fn list_by_vehicle(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Vec<WorkItemResponse>, AppError> {
        let items = self.repository.list_by_vehicle(vehicle_id).await?;
        Ok(items.into_iter().map(WorkItemResponse::from).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateWorkItemRequest,
    ) -> Result<ApiResponse<WorkItemResponse>, AppError> {
        request.validate()?;

        if let Some(work_type) = &request.work_type {
            if WorkType::parse(work_type).is_none() {
                return Err(AppError::BadRequest(format!(
                    "Unknown work_type '{}'",
                    work_type
                )));
            }
        }

        let item = self
            .repository
            .update_fields(
                id,
                request.title,
                request.work_type,
                request.priority,
                request.estimated_cost,
                request.estimated_hours,
                request.vendor_id,
                request.technician_id,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            WorkItemResponse::from(item),
            "Work item actualizado exitosamente".to_string(),
        ))
    }

    /// Aplicar un verbo del lifecycle: se computa el item completo resultante
    /// (pura), se persiste condicionado al status leído y recién después se
    /// despacha el evento. Una transición concurrente desfasada falla con
    /// InvalidTransition sin corromper estado.
    pub async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
    ) -> Result<ApiResponse<WorkItemResponse>, AppError> {
        let item = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work item '{}' not found", id)))?;

        let verb = transition.verb();
        let new_item = lifecycle_service::apply(&item, transition, Utc::now())?;
        let persisted = self
            .repository
            .persist_transition(&new_item, &item.status)
            .await?;

        let step_id = self.current_step_of(persisted.vehicle_id).await;
        let event = DomainEvent::WorkItemTransitioned {
            work_item_id: persisted.id,
            vehicle_id: persisted.vehicle_id,
            step_id,
            title: persisted.title.clone(),
            transition: verb.to_string(),
            technician_id: persisted.technician_id,
            vendor_id: persisted.vendor_id,
        };
        if let Err(e) = self.dispatcher.dispatch(&event).await {
            warn!("⚠️ No se pudo despachar work_item_transitioned: {}", e);
        }

        Ok(ApiResponse::success_with_message(
            WorkItemResponse::from(persisted),
            format!("Work item '{}' aplicado exitosamente", verb),
        ))
    }

    /// Borrado explícito e irreversible. La confirmación del usuario es
    /// responsabilidad del caller de la API.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id).await
    }

    async fn current_step_of(&self, vehicle_id: Uuid) -> Option<Uuid> {
        match self.state_repository.find_open_by_vehicle(vehicle_id).await {
            Ok(state) => state.map(|s| s.step_id),
            Err(e) => {
                warn!("⚠️ No se pudo resolver el step actual del vehículo: {}", e);
                None
            }
        }
    }
}
