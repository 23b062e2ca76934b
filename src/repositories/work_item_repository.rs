use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::work_item::WorkItem;
use crate::utils::errors::AppError;

pub struct WorkItemRepository {
    pool: PgPool,
}

impl WorkItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        vehicle_id: Uuid,
        title: String,
        work_type: String,
        priority: i32,
        estimated_cost: Option<Decimal>,
        estimated_hours: Option<f64>,
        approval_required: bool,
        vendor_id: Option<Uuid>,
        technician_id: Option<Uuid>,
    ) -> Result<WorkItem, AppError> {
        let now = Utc::now();
        let item = sqlx::query_as::<_, WorkItem>(
            r#"
            INSERT INTO work_items (
                id, vehicle_id, title, work_type, priority,
                estimated_cost, actual_cost, estimated_hours, actual_hours,
                approval_required, approval_status, status, status_reason,
                vendor_id, technician_id, scheduled_for,
                created_at, actual_start, actual_completion, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, NULL, $7, NULL,
                $8, NULL, 'pending', NULL, $9, $10, NULL, $11, NULL, NULL, $11
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle_id)
        .bind(title)
        .bind(work_type)
        .bind(priority)
        .bind(estimated_cost)
        .bind(estimated_hours)
        .bind(approval_required)
        .bind(vendor_id)
        .bind(technician_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkItem>, AppError> {
        let item = sqlx::query_as::<_, WorkItem>("SELECT * FROM work_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    pub async fn list_by_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<WorkItem>, AppError> {
        let items = sqlx::query_as::<_, WorkItem>(
            "SELECT * FROM work_items WHERE vehicle_id = $1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Vehículos con work items bloqueantes abiertos no pueden dar el step por limpio
    pub async fn count_open_blocking(&self, vehicle_id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM work_items
            WHERE vehicle_id = $1
              AND status NOT IN ('completed', 'cancelled', 'rejected')
            "#,
        )
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    pub async fn update_fields(
        &self,
        id: Uuid,
        title: Option<String>,
        work_type: Option<String>,
        priority: Option<i32>,
        estimated_cost: Option<Decimal>,
        estimated_hours: Option<f64>,
        vendor_id: Option<Uuid>,
        technician_id: Option<Uuid>,
    ) -> Result<WorkItem, AppError> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Work item not found".to_string()))?;

        let item = sqlx::query_as::<_, WorkItem>(
            r#"
            UPDATE work_items
            SET title = $2, work_type = $3, priority = $4, estimated_cost = $5,
                estimated_hours = $6, vendor_id = $7, technician_id = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(title.unwrap_or(current.title))
        .bind(work_type.unwrap_or(current.work_type))
        .bind(priority.unwrap_or(current.priority))
        .bind(estimated_cost.or(current.estimated_cost))
        .bind(estimated_hours.or(current.estimated_hours))
        .bind(vendor_id.or(current.vendor_id))
        .bind(technician_id.or(current.technician_id))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    /// Persistir una transición ya computada. El WHERE sobre el status leído
    /// resuelve transiciones concurrentes: la escritura desfasada no matchea
    /// ninguna fila y se reporta como InvalidTransition.
    pub async fn persist_transition(
        &self,
        new_item: &WorkItem,
        expected_status: &str,
    ) -> Result<WorkItem, AppError> {
        let updated = sqlx::query_as::<_, WorkItem>(
            r#"
            UPDATE work_items
            SET status = $3, status_reason = $4, approval_status = $5,
                actual_cost = $6, actual_hours = $7, scheduled_for = $8,
                actual_start = $9, actual_completion = $10, updated_at = $11
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(new_item.id)
        .bind(expected_status)
        .bind(&new_item.status)
        .bind(&new_item.status_reason)
        .bind(&new_item.approval_status)
        .bind(new_item.actual_cost)
        .bind(new_item.actual_hours)
        .bind(new_item.scheduled_for)
        .bind(new_item.actual_start)
        .bind(new_item.actual_completion)
        .bind(new_item.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| {
            AppError::InvalidTransition(format!(
                "Work item '{}' was modified concurrently, expected status '{}'",
                new_item.id, expected_status
            ))
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM work_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Work item '{}' not found", id)));
        }

        Ok(())
    }
}
