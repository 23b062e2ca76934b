use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle_state::{days_between, VehicleStepState};
use crate::utils::errors::AppError;

pub struct VehicleStateRepository {
    pool: PgPool,
}

impl VehicleStateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Estado abierto del vehículo (a lo sumo uno)
    pub async fn find_open_by_vehicle(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Option<VehicleStepState>, AppError> {
        let state = sqlx::query_as::<_, VehicleStepState>(
            "SELECT * FROM vehicle_step_states WHERE vehicle_id = $1 AND exited_at IS NULL",
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    pub async fn list_open_by_step(
        &self,
        step_id: Uuid,
    ) -> Result<Vec<VehicleStepState>, AppError> {
        let states = sqlx::query_as::<_, VehicleStepState>(
            "SELECT * FROM vehicle_step_states WHERE step_id = $1 AND exited_at IS NULL ORDER BY entered_at ASC",
        )
        .bind(step_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(states)
    }

    /// Mover un vehículo de step: cierra el estado abierto congelando su dwell
    /// y abre el nuevo, todo en una transacción. Devuelve (estado cerrado, estado nuevo).
    pub async fn move_to_step(
        &self,
        vehicle_id: Uuid,
        step_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Option<VehicleStepState>, VehicleStepState), AppError> {
        let mut tx = self.pool.begin().await?;

        let open = sqlx::query_as::<_, VehicleStepState>(
            "SELECT * FROM vehicle_step_states WHERE vehicle_id = $1 AND exited_at IS NULL FOR UPDATE",
        )
        .bind(vehicle_id)
        .fetch_optional(&mut *tx)
        .await?;

        let closed = if let Some(open_state) = open {
            // Congelar el dwell acumulado antes de cerrar
            let frozen = days_between(open_state.entered_at, now);
            let closed = sqlx::query_as::<_, VehicleStepState>(
                r#"
                UPDATE vehicle_step_states
                SET exited_at = $2, frozen_days = $3
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(open_state.id)
            .bind(now)
            .bind(frozen)
            .fetch_one(&mut *tx)
            .await?;
            Some(closed)
        } else {
            None
        };

        let opened = sqlx::query_as::<_, VehicleStepState>(
            r#"
            INSERT INTO vehicle_step_states (id, vehicle_id, step_id, entered_at, exited_at, frozen_days)
            VALUES ($1, $2, $3, $4, NULL, NULL)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle_id)
        .bind(step_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((closed, opened))
    }

    /// Vehículos que salieron del step en las últimas 24h (throughput real)
    pub async fn completions_last_24h(
        &self,
        step_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let since = now - Duration::hours(24);
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM vehicle_step_states WHERE step_id = $1 AND exited_at IS NOT NULL AND exited_at > $2",
        )
        .bind(step_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
