use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::environment::EnvironmentConfig;
use crate::dto::notification_dto::{
    DispatchSummaryResponse, UnreadCountResponse, UpdatePreferencesRequest,
};
use crate::dto::response::ApiResponse;
use crate::models::notification::{DomainEvent, NotificationPreference};
use crate::repositories::notification_repository::NotificationRepository;
use crate::services::notification_service::{parse_quiet_time, NotificationDispatcher};
use crate::utils::errors::AppError;

pub struct NotificationController {
    repository: NotificationRepository,
    dispatcher: NotificationDispatcher,
}

impl NotificationController {
    pub fn new(pool: PgPool, config: &EnvironmentConfig, http: reqwest::Client) -> Self {
        Self {
            repository: NotificationRepository::new(pool.clone()),
            dispatcher: NotificationDispatcher::new(pool, config, http),
        }
    }

    pub async fn dispatch(
        &self,
        event: DomainEvent,
    ) -> Result<ApiResponse<DispatchSummaryResponse>, AppError> {
        let summary = self.dispatcher.dispatch(&event).await?;
        Ok(ApiResponse::success(summary))
    }

    pub async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<NotificationPreference, AppError> {
        self.repository.get_or_default(user_id).await
    }

    /// Patch parcial de preferencias: los campos ausentes conservan el
    /// valor actual (o el default si el usuario nunca configuró).
    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        request: UpdatePreferencesRequest,
    ) -> Result<ApiResponse<NotificationPreference>, AppError> {
        request.validate()?;

        for window_mark in [&request.quiet_hours_start, &request.quiet_hours_end] {
            if let Some(value) = window_mark {
                if parse_quiet_time(value).is_none() {
                    return Err(AppError::BadRequest(format!(
                        "Invalid quiet hours mark '{}', expected HH:MM",
                        value
                    )));
                }
            }
        }

        if let Some(offset) = request.tz_offset_minutes {
            if !(-840..=840).contains(&offset) {
                return Err(AppError::BadRequest(format!(
                    "tz_offset_minutes '{}' out of range (-840..=840)",
                    offset
                )));
            }
        }

        let mut pref = self.repository.get_or_default(user_id).await?;

        if let Some(v) = request.notify_sla_warning { pref.notify_sla_warning = v; }
        if let Some(v) = request.notify_sla_critical { pref.notify_sla_critical = v; }
        if let Some(v) = request.notify_approvals { pref.notify_approvals = v; }
        if let Some(v) = request.notify_bottlenecks { pref.notify_bottlenecks = v; }
        if let Some(v) = request.notify_vehicle_status { pref.notify_vehicle_status = v; }
        if let Some(v) = request.notify_work_items { pref.notify_work_items = v; }
        if let Some(v) = request.notify_step_completion { pref.notify_step_completion = v; }
        if let Some(v) = request.notify_system { pref.notify_system = v; }
        if let Some(v) = request.channel_in_app { pref.channel_in_app = v; }
        if let Some(v) = request.channel_email { pref.channel_email = v; }
        if let Some(v) = request.channel_sound { pref.channel_sound = v; }
        if let Some(v) = request.channel_desktop { pref.channel_desktop = v; }
        if let Some(v) = request.quiet_hours_start { pref.quiet_hours_start = Some(v); }
        if let Some(v) = request.quiet_hours_end { pref.quiet_hours_end = Some(v); }
        if let Some(v) = request.tz_offset_minutes { pref.tz_offset_minutes = v; }
        if let Some(v) = request.auto_dismiss_read_days { pref.auto_dismiss_read_days = v; }
        if let Some(v) = request.auto_dismiss_unread_days { pref.auto_dismiss_unread_days = v; }

        let saved = self.repository.upsert_preferences(&pref).await?;

        Ok(ApiResponse::success_with_message(
            saved,
            "Preferencias actualizadas exitosamente".to_string(),
        ))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<UnreadCountResponse, AppError> {
        let unread = self.repository.unread_count(user_id).await?;
        Ok(UnreadCountResponse { user_id, unread })
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<(), AppError> {
        self.repository.mark_read(id).await
    }
}
