use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::{Notification, NotificationPreference};
use crate::utils::errors::AppError;

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreference>, AppError> {
        let pref = sqlx::query_as::<_, NotificationPreference>(
            "SELECT * FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pref)
    }

    /// Preferencias del usuario, o las por defecto si nunca configuró
    pub async fn get_or_default(
        &self,
        user_id: Uuid,
    ) -> Result<NotificationPreference, AppError> {
        Ok(self
            .get_preferences(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreference::defaults_for(user_id)))
    }

    pub async fn upsert_preferences(
        &self,
        pref: &NotificationPreference,
    ) -> Result<NotificationPreference, AppError> {
        let saved = sqlx::query_as::<_, NotificationPreference>(
            r#"
            INSERT INTO notification_preferences (
                user_id, notify_sla_warning, notify_sla_critical, notify_approvals,
                notify_bottlenecks, notify_vehicle_status, notify_work_items,
                notify_step_completion, notify_system,
                channel_in_app, channel_email, channel_sound, channel_desktop,
                quiet_hours_start, quiet_hours_end, tz_offset_minutes,
                auto_dismiss_read_days, auto_dismiss_unread_days, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (user_id) DO UPDATE SET
                notify_sla_warning = EXCLUDED.notify_sla_warning,
                notify_sla_critical = EXCLUDED.notify_sla_critical,
                notify_approvals = EXCLUDED.notify_approvals,
                notify_bottlenecks = EXCLUDED.notify_bottlenecks,
                notify_vehicle_status = EXCLUDED.notify_vehicle_status,
                notify_work_items = EXCLUDED.notify_work_items,
                notify_step_completion = EXCLUDED.notify_step_completion,
                notify_system = EXCLUDED.notify_system,
                channel_in_app = EXCLUDED.channel_in_app,
                channel_email = EXCLUDED.channel_email,
                channel_sound = EXCLUDED.channel_sound,
                channel_desktop = EXCLUDED.channel_desktop,
                quiet_hours_start = EXCLUDED.quiet_hours_start,
                quiet_hours_end = EXCLUDED.quiet_hours_end,
                tz_offset_minutes = EXCLUDED.tz_offset_minutes,
                auto_dismiss_read_days = EXCLUDED.auto_dismiss_read_days,
                auto_dismiss_unread_days = EXCLUDED.auto_dismiss_unread_days,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(pref.user_id)
        .bind(pref.notify_sla_warning)
        .bind(pref.notify_sla_critical)
        .bind(pref.notify_approvals)
        .bind(pref.notify_bottlenecks)
        .bind(pref.notify_vehicle_status)
        .bind(pref.notify_work_items)
        .bind(pref.notify_step_completion)
        .bind(pref.notify_system)
        .bind(pref.channel_in_app)
        .bind(pref.channel_email)
        .bind(pref.channel_sound)
        .bind(pref.channel_desktop)
        .bind(&pref.quiet_hours_start)
        .bind(&pref.quiet_hours_end)
        .bind(pref.tz_offset_minutes)
        .bind(pref.auto_dismiss_read_days)
        .bind(pref.auto_dismiss_unread_days)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    /// Registro in-app: siempre se inserta, es la fuente del badge de no-leídas
    pub async fn insert_notification(
        &self,
        user_id: Uuid,
        category: &str,
        priority: &str,
        title: &str,
        body: &str,
        sound: bool,
    ) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, category, priority, title, body, sound, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(category)
        .bind(priority)
        .bind(title)
        .bind(body)
        .bind(sound)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Notification '{}' not found",
                id
            )));
        }

        Ok(())
    }

    /// Barrido de retención: borra notificaciones según las ventanas
    /// auto-dismiss configuradas por cada usuario. Usuarios sin preferencias
    /// guardadas no se barren (retención indefinida hasta que configuren).
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM notifications n
            USING notification_preferences p
            WHERE n.user_id = p.user_id
              AND (
                (n.read = TRUE AND n.created_at < $1 - make_interval(days => p.auto_dismiss_read_days))
                OR
                (n.read = FALSE AND n.created_at < $1 - make_interval(days => p.auto_dismiss_unread_days))
              )
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
