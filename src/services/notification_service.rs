//! Dispatcher de notificaciones
//! 
//! Consume eventos de dominio, resuelve los usuarios destino (asignados al
//! step más técnico/vendor del work item), filtra por preferencias y quiet
//! hours, y hace fan-out a los canales habilitados. El registro in-app se
//! escribe siempre que la categoría esté habilitada: es la fuente del badge
//! de no-leídas. El fallo de un canal nunca bloquea a los demás.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use futures::future::join_all;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::dto::notification_dto::{DeliveryOutcome, DispatchSummaryResponse};
use crate::models::notification::{DeliveryChannel, DomainEvent, NotificationPreference};
use crate::repositories::notification_repository::NotificationRepository;
use crate::repositories::step_repository::StepRepository;
use crate::utils::errors::{AppError, AppResult};

/// Contenido ya resuelto de una notificación lista para entregar
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub category: String,
    pub priority: String,
    pub title: String,
    pub body: String,
    pub sound: bool,
}

/// Contrato común de los canales de entrega
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn channel(&self) -> DeliveryChannel;

    async fn deliver(&self, user_id: Uuid, payload: &NotificationPayload) -> AppResult<()>;
}

/// Canal in-app: inserta el registro autoritativo en la base
pub struct InAppChannel {
    repo: NotificationRepository,
}

#[async_trait]
impl NotificationChannel for InAppChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::InApp
    }

    async fn deliver(&self, user_id: Uuid, payload: &NotificationPayload) -> AppResult<()> {
        self.repo
            .insert_notification(
                user_id,
                &payload.category,
                &payload.priority,
                &payload.title,
                &payload.body,
                payload.sound,
            )
            .await?;
        Ok(())
    }
}

/// Canal que entrega contra un gateway HTTP externo (email relay,
/// push gateway). El transporte real es un colaborador externo: sin URL
/// configurada la entrega se omite con un log.
pub struct GatewayChannel {
    kind: DeliveryChannel,
    http: reqwest::Client,
    gateway_url: Option<String>,
}

#[async_trait]
impl NotificationChannel for GatewayChannel {
    fn channel(&self) -> DeliveryChannel {
        self.kind
    }

    async fn deliver(&self, user_id: Uuid, payload: &NotificationPayload) -> AppResult<()> {
        let url = match &self.gateway_url {
            Some(url) => url,
            None => {
                debug!(
                    "📭 Canal {} sin gateway configurado, entrega omitida",
                    self.kind.as_str()
                );
                return Ok(());
            }
        };

        self.http
            .post(url)
            .json(&serde_json::json!({
                "channel": self.kind.as_str(),
                "user_id": user_id,
                "category": payload.category,
                "priority": payload.priority,
                "title": payload.title,
                "body": payload.body,
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("{} gateway: {}", self.kind.as_str(), e)))?
            .error_for_status()
            .map_err(|e| AppError::ExternalApi(format!("{} gateway: {}", self.kind.as_str(), e)))?;

        Ok(())
    }
}

/// Parsear una marca HH:MM de quiet hours (formato estricto)
pub fn parse_quiet_time(value: &str) -> Option<NaiveTime> {
    crate::utils::validation::validate_clock_time(value).ok()
}

/// Hora local de referencia del usuario (offset configurado en preferencias)
pub fn local_reference_time(now: DateTime<Utc>, tz_offset_minutes: i32) -> NaiveTime {
    (now + Duration::minutes(tz_offset_minutes as i64)).time()
}

/// Evaluar si un instante cae dentro de la ventana de quiet hours.
/// Una ventana que cruza medianoche (start > end) se trata como dos
/// intervalos semiabiertos: [start, 24:00) y [00:00, end).
/// start == end se interpreta como ventana deshabilitada.
pub fn in_quiet_hours(pref: &NotificationPreference, at: NaiveTime) -> bool {
    let (start, end) = match (&pref.quiet_hours_start, &pref.quiet_hours_end) {
        (Some(start), Some(end)) => match (parse_quiet_time(start), parse_quiet_time(end)) {
            (Some(s), Some(e)) => (s, e),
            _ => return false,
        },
        _ => return false,
    };

    if start == end {
        return false;
    }

    if start < end {
        at >= start && at < end
    } else {
        at >= start || at < end
    }
}

/// Canales a los que se entrega para un usuario dado. In-app siempre está
/// presente, independiente de sus toggles de canal; quiet hours suprime
/// todos los demás.
pub fn enabled_channels(pref: &NotificationPreference, quiet: bool) -> Vec<DeliveryChannel> {
    let mut channels = vec![DeliveryChannel::InApp];
    if quiet {
        return channels;
    }
    for channel in [
        DeliveryChannel::Email,
        DeliveryChannel::Sound,
        DeliveryChannel::Desktop,
    ] {
        if pref.channel_enabled(channel) {
            channels.push(channel);
        }
    }
    channels
}

/// Dispatcher: resuelve destinos y hace el fan-out por canal
pub struct NotificationDispatcher {
    step_repo: StepRepository,
    notification_repo: NotificationRepository,
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new(pool: PgPool, config: &EnvironmentConfig, http: reqwest::Client) -> Self {
        let notification_repo = NotificationRepository::new(pool.clone());
        let channels: Vec<Box<dyn NotificationChannel>> = vec![
            Box::new(InAppChannel {
                repo: notification_repo.clone(),
            }),
            Box::new(GatewayChannel {
                kind: DeliveryChannel::Email,
                http: http.clone(),
                gateway_url: config.email_relay_url.clone(),
            }),
            Box::new(GatewayChannel {
                kind: DeliveryChannel::Sound,
                http: http.clone(),
                gateway_url: config.push_gateway_url.clone(),
            }),
            Box::new(GatewayChannel {
                kind: DeliveryChannel::Desktop,
                http,
                gateway_url: config.push_gateway_url.clone(),
            }),
        ];

        Self {
            step_repo: StepRepository::new(pool),
            notification_repo,
            channels,
        }
    }

    /// Usuarios destino del evento: asignados al step afectado más los
    /// involucrados directos (técnico, vendor), sin duplicados.
    async fn resolve_targets(&self, event: &DomainEvent) -> AppResult<Vec<Uuid>> {
        let mut targets: Vec<Uuid> = Vec::new();

        if let Some(step_id) = event.step_id() {
            for assignment in self.step_repo.assignments_for_step(step_id).await? {
                if !targets.contains(&assignment.user_id) {
                    targets.push(assignment.user_id);
                }
            }
        }

        for user_id in event.direct_user_ids() {
            if !targets.contains(&user_id) {
                targets.push(user_id);
            }
        }

        Ok(targets)
    }

    /// Despachar un evento de dominio a todos sus destinos
    pub async fn dispatch(&self, event: &DomainEvent) -> AppResult<DispatchSummaryResponse> {
        let category = event.category();
        let now = Utc::now();

        let targets = self.resolve_targets(event).await?;
        let mut deliveries: Vec<DeliveryOutcome> = Vec::new();

        for user_id in &targets {
            let pref = self.notification_repo.get_or_default(*user_id).await?;

            // Categoría deshabilitada: el evento se descarta para este usuario
            if !pref.category_enabled(category) {
                continue;
            }

            let local_time = local_reference_time(now, pref.tz_offset_minutes);
            let quiet = in_quiet_hours(&pref, local_time);
            let channels = enabled_channels(&pref, quiet);

            let payload = NotificationPayload {
                category: category.as_str().to_string(),
                priority: event.priority().to_string(),
                title: event.title(),
                body: event.body(),
                sound: channels.contains(&DeliveryChannel::Sound),
            };

            // Fan-out independiente: cada canal entrega o falla por su cuenta
            let futures = self
                .channels
                .iter()
                .filter(|c| channels.contains(&c.channel()))
                .map(|c| {
                    let payload = payload.clone();
                    let user_id = *user_id;
                    async move {
                        let result = c.deliver(user_id, &payload).await;
                        (c.channel(), result)
                    }
                });

            for (channel, result) in join_all(futures).await {
                let outcome = match result {
                    Ok(()) => DeliveryOutcome {
                        user_id: *user_id,
                        channel: channel.as_str().to_string(),
                        delivered: true,
                        detail: None,
                    },
                    Err(e) => {
                        warn!(
                            "⚠️ Falló la entrega {} para usuario {}: {}",
                            channel.as_str(),
                            user_id,
                            e
                        );
                        DeliveryOutcome {
                            user_id: *user_id,
                            channel: channel.as_str().to_string(),
                            delivered: false,
                            detail: Some(e.to_string()),
                        }
                    }
                };
                deliveries.push(outcome);
            }
        }

        Ok(DispatchSummaryResponse {
            category: category.as_str().to_string(),
            targets: targets.len(),
            deliveries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pref_with_window(start: &str, end: &str) -> NotificationPreference {
        let mut pref = NotificationPreference::defaults_for(Uuid::new_v4());
        pref.quiet_hours_start = Some(start.to_string());
        pref.quiet_hours_end = Some(end.to_string());
        pref
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_quiet_hours_wrap_around_midnight() {
        let pref = pref_with_window("22:00", "08:00");

        assert!(in_quiet_hours(&pref, at(23, 30)));
        assert!(in_quiet_hours(&pref, at(22, 0)));
        assert!(in_quiet_hours(&pref, at(3, 0)));
        assert!(in_quiet_hours(&pref, at(7, 59)));

        assert!(!in_quiet_hours(&pref, at(8, 0)));
        assert!(!in_quiet_hours(&pref, at(9, 0)));
        assert!(!in_quiet_hours(&pref, at(21, 59)));
    }

    #[test]
    fn test_quiet_hours_same_day_window() {
        let pref = pref_with_window("12:00", "14:00");

        assert!(in_quiet_hours(&pref, at(12, 0)));
        assert!(in_quiet_hours(&pref, at(13, 30)));
        assert!(!in_quiet_hours(&pref, at(14, 0)));
        assert!(!in_quiet_hours(&pref, at(11, 59)));
    }

    #[test]
    fn test_quiet_hours_disabled_cases() {
        // Sin ventana configurada
        let none = NotificationPreference::defaults_for(Uuid::new_v4());
        assert!(!in_quiet_hours(&none, at(3, 0)));

        // start == end se interpreta como deshabilitada
        let degenerate = pref_with_window("08:00", "08:00");
        assert!(!in_quiet_hours(&degenerate, at(8, 0)));
        assert!(!in_quiet_hours(&degenerate, at(3, 0)));

        // Formato inválido no suprime nada
        let broken = pref_with_window("25:00", "08:00");
        assert!(!in_quiet_hours(&broken, at(3, 0)));
    }

    #[test]
    fn test_quiet_hours_suppress_all_channels_except_in_app() {
        let mut pref = pref_with_window("22:00", "08:00");
        pref.channel_email = true;
        pref.channel_sound = true;
        pref.channel_desktop = true;

        let quiet = in_quiet_hours(&pref, at(23, 30));
        assert!(quiet);
        assert_eq!(enabled_channels(&pref, quiet), vec![DeliveryChannel::InApp]);

        let awake = in_quiet_hours(&pref, at(9, 0));
        assert!(!awake);
        let channels = enabled_channels(&pref, awake);
        assert!(channels.contains(&DeliveryChannel::InApp));
        assert!(channels.contains(&DeliveryChannel::Email));
        assert!(channels.contains(&DeliveryChannel::Sound));
        assert!(channels.contains(&DeliveryChannel::Desktop));
    }

    #[test]
    fn test_in_app_recorded_regardless_of_channel_toggles() {
        let mut pref = NotificationPreference::defaults_for(Uuid::new_v4());
        pref.channel_in_app = false;
        pref.channel_email = false;
        pref.channel_sound = false;
        pref.channel_desktop = false;

        // El badge de no-leídas depende del registro in-app, así que
        // siempre está presente aunque el usuario lo apague
        assert_eq!(enabled_channels(&pref, false), vec![DeliveryChannel::InApp]);
    }

    #[test]
    fn test_local_reference_time_applies_offset() {
        let now = DateTime::parse_from_rfc3339("2026-08-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(local_reference_time(now, 0), at(12, 0));
        assert_eq!(local_reference_time(now, 120), at(14, 0));
        assert_eq!(local_reference_time(now, -300), at(7, 0));
    }

    #[test]
    fn test_parse_quiet_time() {
        assert_eq!(parse_quiet_time("22:00"), Some(at(22, 0)));
        assert_eq!(parse_quiet_time("8:5"), None);
        assert_eq!(parse_quiet_time("garbage"), None);
    }
}
