use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::response::ApiResponse;
use crate::dto::step_dto::{
    AssignUsersRequest, CreateStepRequest, PipelineResponse, ReorderStepsRequest,
    StepAssignmentsResponse, StepResponse, UpdateStepRequest,
};
use crate::models::step::{positions_are_dense, validate_reorder};
use crate::repositories::step_repository::StepRepository;
use crate::utils::errors::{bad_request_error, AppError};

pub struct StepController {
    repository: StepRepository,
}

impl StepController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: StepRepository::new(pool),
        }
    }

    pub async fn list(&self) -> Result<PipelineResponse, AppError> {
        let revision = self.repository.current_revision().await?;
        let steps = self.repository.list().await?;

        if !positions_are_dense(&steps) {
            log::warn!("⚠️ Posiciones del pipeline no densas, se requiere reorder");
        }

        Ok(PipelineResponse {
            revision,
            steps: steps.into_iter().map(StepResponse::from).collect(),
        })
    }

    pub async fn create(
        &self,
        request: CreateStepRequest,
    ) -> Result<ApiResponse<StepResponse>, AppError> {
        request.validate()?;

        if request.name.trim().is_empty() {
            return Err(bad_request_error("El nombre del step es requerido"));
        }

        let step = self
            .repository
            .create(
                request.name.trim().to_string(),
                request.color,
                request.icon,
                request.sla_hours,
                request.cost_per_day.unwrap_or(Decimal::ZERO),
                request.is_last_step,
                request.target_throughput.unwrap_or(0),
                request.bottleneck_threshold_hours.unwrap_or(0),
                request.parallel_capable,
                request.express_lane_eligible,
                request.show_in_sidebar.unwrap_or(true),
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            StepResponse::from(step),
            "Step creado exitosamente".to_string(),
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateStepRequest,
    ) -> Result<ApiResponse<StepResponse>, AppError> {
        request.validate()?;

        let step = self
            .repository
            .update(
                id,
                request.name,
                request.color,
                request.icon,
                request.sla_hours,
                request.cost_per_day,
                request.is_last_step,
                request.target_throughput,
                request.bottleneck_threshold_hours,
                request.parallel_capable,
                request.express_lane_eligible,
                request.show_in_sidebar,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            StepResponse::from(step),
            "Step actualizado exitosamente".to_string(),
        ))
    }

    /// Reorder atómico del pipeline completo. La validación de permutación
    /// corre acá con la lectura del caller y de nuevo dentro de la
    /// transacción del repositorio.
    pub async fn reorder(
        &self,
        request: ReorderStepsRequest,
    ) -> Result<ApiResponse<PipelineResponse>, AppError> {
        let current = self.repository.list().await?;
        let current_ids: Vec<Uuid> = current.iter().map(|s| s.id).collect();
        validate_reorder(&current_ids, &request.ordered_ids)?;

        let (revision, steps) = self
            .repository
            .reorder(&request.ordered_ids, request.expected_revision)
            .await?;

        Ok(ApiResponse::success_with_message(
            PipelineResponse {
                revision,
                steps: steps.into_iter().map(StepResponse::from).collect(),
            },
            "Pipeline reordenado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id).await
    }

    /// Replace-all de asignaciones: la lista enviada sustituye por completo
    /// a la existente, una lista vacía limpia el step.
    pub async fn assign_users(
        &self,
        step_id: Uuid,
        request: AssignUsersRequest,
    ) -> Result<ApiResponse<StepAssignmentsResponse>, AppError> {
        request.validate()?;

        let step = self
            .repository
            .find_by_id(step_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Step '{}' not found", step_id)))?;

        let assignments = self
            .repository
            .replace_assignments(step.id, &request.user_ids, request.role.trim())
            .await?;

        Ok(ApiResponse::success_with_message(
            StepAssignmentsResponse {
                step_id: step.id,
                role: request.role.trim().to_string(),
                user_ids: assignments.into_iter().map(|a| a.user_id).collect(),
                updated_at: chrono::Utc::now(),
            },
            "Asignaciones reemplazadas exitosamente".to_string(),
        ))
    }
}
