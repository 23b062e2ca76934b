use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::step::{validate_reorder, Step, StepAssignment};
use crate::utils::errors::AppError;

pub struct StepRepository {
    pool: PgPool,
}

impl StepRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Step>, AppError> {
        let steps = sqlx::query_as::<_, Step>(
            "SELECT * FROM recon_steps ORDER BY position ASC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(steps)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Step>, AppError> {
        let step = sqlx::query_as::<_, Step>("SELECT * FROM recon_steps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(step)
    }

    /// Revisión actual del pipeline (0 si nunca se tocó)
    pub async fn current_revision(&self) -> Result<i64, AppError> {
        let revision: Option<(i64,)> =
            sqlx::query_as("SELECT revision FROM pipeline_revision WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(revision.map(|r| r.0).unwrap_or(0))
    }

    /// Crear step asignando la siguiente posición libre (N+1)
    pub async fn create(
        &self,
        name: String,
        color: Option<String>,
        icon: Option<String>,
        sla_hours: i32,
        cost_per_day: Decimal,
        is_last_step: bool,
        target_throughput: i32,
        bottleneck_threshold_hours: i32,
        parallel_capable: bool,
        express_lane_eligible: bool,
        show_in_sidebar: bool,
    ) -> Result<Step, AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let step = sqlx::query_as::<_, Step>(
            r#"
            INSERT INTO recon_steps (
                id, position, name, color, icon, sla_hours, cost_per_day,
                is_last_step, target_throughput, bottleneck_threshold_hours,
                parallel_capable, express_lane_eligible, show_in_sidebar,
                created_at, updated_at
            )
            VALUES (
                $1, (SELECT COALESCE(MAX(position), 0) + 1 FROM recon_steps),
                $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(color)
        .bind(icon)
        .bind(sla_hours)
        .bind(cost_per_day)
        .bind(is_last_step)
        .bind(target_throughput)
        .bind(bottleneck_threshold_hours)
        .bind(parallel_capable)
        .bind(express_lane_eligible)
        .bind(show_in_sidebar)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        Self::bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(step)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        color: Option<String>,
        icon: Option<String>,
        sla_hours: Option<i32>,
        cost_per_day: Option<Decimal>,
        is_last_step: Option<bool>,
        target_throughput: Option<i32>,
        bottleneck_threshold_hours: Option<i32>,
        parallel_capable: Option<bool>,
        express_lane_eligible: Option<bool>,
        show_in_sidebar: Option<bool>,
    ) -> Result<Step, AppError> {
        // Obtener step actual
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Step not found".to_string()))?;

        let step = sqlx::query_as::<_, Step>(
            r#"
            UPDATE recon_steps
            SET name = $2, color = $3, icon = $4, sla_hours = $5, cost_per_day = $6,
                is_last_step = $7, target_throughput = $8, bottleneck_threshold_hours = $9,
                parallel_capable = $10, express_lane_eligible = $11, show_in_sidebar = $12,
                updated_at = $13
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name.unwrap_or(current.name))
        .bind(color.or(current.color))
        .bind(icon.or(current.icon))
        .bind(sla_hours.unwrap_or(current.sla_hours))
        .bind(cost_per_day.unwrap_or(current.cost_per_day))
        .bind(is_last_step.unwrap_or(current.is_last_step))
        .bind(target_throughput.unwrap_or(current.target_throughput))
        .bind(bottleneck_threshold_hours.unwrap_or(current.bottleneck_threshold_hours))
        .bind(parallel_capable.unwrap_or(current.parallel_capable))
        .bind(express_lane_eligible.unwrap_or(current.express_lane_eligible))
        .bind(show_in_sidebar.unwrap_or(current.show_in_sidebar))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(step)
    }

    /// Reordenar el pipeline completo en una sola transacción.
    /// La revisión serializa reorders concurrentes: un expected_revision
    /// desfasado falla con OrdinalConflict sin tocar nada.
    pub async fn reorder(
        &self,
        ordered_ids: &[Uuid],
        expected_revision: Option<i64>,
    ) -> Result<(i64, Vec<Step>), AppError> {
        let mut tx = self.pool.begin().await?;

        let revision: Option<(i64,)> =
            sqlx::query_as("SELECT revision FROM pipeline_revision WHERE id = 1 FOR UPDATE")
                .fetch_optional(&mut *tx)
                .await?;
        let revision = revision.map(|r| r.0).unwrap_or(0);

        if let Some(expected) = expected_revision {
            if expected != revision {
                return Err(AppError::OrdinalConflict(format!(
                    "Pipeline revision mismatch: expected {}, current {}",
                    expected, revision
                )));
            }
        }

        let current_ids: Vec<(Uuid,)> =
            sqlx::query_as("SELECT id FROM recon_steps ORDER BY position ASC FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;
        let current_ids: Vec<Uuid> = current_ids.into_iter().map(|r| r.0).collect();

        // Re-validar dentro de la transacción: el set pudo cambiar desde la lectura del caller
        validate_reorder(&current_ids, ordered_ids)?;

        // Liberar las posiciones antes de reasignar 1..N (índice único sobre position)
        sqlx::query("UPDATE recon_steps SET position = -position")
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        for (index, step_id) in ordered_ids.iter().enumerate() {
            sqlx::query("UPDATE recon_steps SET position = $1, updated_at = $2 WHERE id = $3")
                .bind((index as i32) + 1)
                .bind(now)
                .bind(step_id)
                .execute(&mut *tx)
                .await?;
        }

        let new_revision = Self::bump_revision(&mut tx).await?;
        tx.commit().await?;

        let steps = self.list().await?;
        Ok((new_revision, steps))
    }

    /// Eliminar un step. Falla con StepInUse si hay vehículos ocupándolo;
    /// al eliminar se compactan las posiciones restantes a 1..N.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM recon_steps WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Step '{}' not found", id)));
        }

        let occupied: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM vehicle_step_states WHERE step_id = $1 AND exited_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if occupied.0 > 0 {
            return Err(AppError::StepInUse(format!(
                "Cannot delete step: {} vehicle(s) currently in it",
                occupied.0
            )));
        }

        sqlx::query("DELETE FROM step_assignments WHERE step_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM recon_steps WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Compactar posiciones para preservar el invariante 1..N
        let remaining: Vec<(Uuid,)> =
            sqlx::query_as("SELECT id FROM recon_steps ORDER BY position ASC FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("UPDATE recon_steps SET position = -position")
            .execute(&mut *tx)
            .await?;

        for (index, (step_id,)) in remaining.iter().enumerate() {
            sqlx::query("UPDATE recon_steps SET position = $1 WHERE id = $2")
                .bind((index as i32) + 1)
                .bind(step_id)
                .execute(&mut *tx)
                .await?;
        }

        Self::bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Cuántos vehículos ocupan actualmente el step
    pub async fn count_open_vehicles(&self, step_id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM vehicle_step_states WHERE step_id = $1 AND exited_at IS NULL",
        )
        .bind(step_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Reemplazo total de las asignaciones de un step (replace-all, sin diff)
    pub async fn replace_assignments(
        &self,
        step_id: Uuid,
        user_ids: &[Uuid],
        role: &str,
    ) -> Result<Vec<StepAssignment>, AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        sqlx::query("DELETE FROM step_assignments WHERE step_id = $1")
            .bind(step_id)
            .execute(&mut *tx)
            .await?;

        for user_id in user_ids {
            sqlx::query(
                "INSERT INTO step_assignments (step_id, user_id, role, created_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(step_id)
            .bind(user_id)
            .bind(role)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.assignments_for_step(step_id).await
    }

    pub async fn assignments_for_step(
        &self,
        step_id: Uuid,
    ) -> Result<Vec<StepAssignment>, AppError> {
        let assignments = sqlx::query_as::<_, StepAssignment>(
            "SELECT * FROM step_assignments WHERE step_id = $1 ORDER BY created_at ASC",
        )
        .bind(step_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }

    async fn bump_revision(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<i64, AppError> {
        let revision: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO pipeline_revision (id, revision)
            VALUES (1, 1)
            ON CONFLICT (id) DO UPDATE SET revision = pipeline_revision.revision + 1
            RETURNING revision
            "#,
        )
        .fetch_one(&mut **tx)
        .await?;

        Ok(revision.0)
    }
}
