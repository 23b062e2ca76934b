mod config;
mod state;
mod database;
mod services;
mod utils;
mod models;
mod middleware;
mod controllers;
mod repositories;
mod routes;
mod dto;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

use config::environment::EnvironmentConfig;
use middleware::cors::{cors_middleware, cors_middleware_with_origins};
use repositories::notification_repository::NotificationRepository;
use state::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Recon Tracking - Pipeline de reacondicionamiento");
    info!("===================================================");

    // Inicializar base de datos
    let pool = match database::connection::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let config = EnvironmentConfig::default();
    if config.is_development() {
        info!("🔧 Modo desarrollo: CORS permisivo");
    }
    let app_state = AppState::new(pool.clone(), config.clone());

    // Barrido periódico de retención de notificaciones (auto-dismiss)
    let purge_repo = NotificationRepository::new(pool);
    let purge_interval = config.purge_interval_secs;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(purge_interval.max(60)));
        loop {
            interval.tick().await;
            match purge_repo.purge_expired(chrono::Utc::now()).await {
                Ok(purged) if purged > 0 => {
                    info!("🧹 Retención: {} notificaciones expiradas eliminadas", purged)
                }
                Ok(_) => {}
                Err(e) => warn!("⚠️ Falló el barrido de retención: {}", e),
            }
        }
    });

    // CORS: permisivo en desarrollo, orígenes explícitos si están configurados
    let cors = if config.cors_origins.is_empty() {
        cors_middleware()
    } else {
        cors_middleware_with_origins(config.cors_origins.clone())
    };

    // Crear router de la API
    let app = Router::new()
        .route("/test", get(test_endpoint))
        .nest("/api/step", routes::step_routes::create_step_router())
        .nest("/api/vehicle", routes::vehicle_routes::create_vehicle_router())
        .nest("/api/work-item", routes::work_item_routes::create_work_item_router())
        .nest("/api/alerts", routes::alert_routes::create_alert_router())
        .nest("/api/notification", routes::notification_routes::create_notification_router())
        .layer(cors)
        .with_state(app_state);

    // Puerto del servidor
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /test - Endpoint de prueba");
    info!("🪜 Endpoints - Step Registry:");
    info!("   GET  /api/step - Listar pipeline ordenado");
    info!("   POST /api/step - Crear step (asigna posición N+1)");
    info!("   POST /api/step/reorder - Reordenar pipeline (atómico)");
    info!("   PUT  /api/step/:id - Actualizar step");
    info!("   DELETE /api/step/:id - Eliminar step (falla si está ocupado)");
    info!("   POST /api/step/:id/assignments - Reemplazar asignaciones");
    info!("🚙 Endpoints - Progresión de vehículos:");
    info!("   POST /api/vehicle/:id/move - Mover vehículo de step");
    info!("   GET  /api/vehicle/:id/step-state - Estado actual y day bucket");
    info!("🔧 Endpoints - Work Items:");
    info!("   POST /api/work-item - Crear work item");
    info!("   GET  /api/work-item/:id - Obtener work item");
    info!("   GET  /api/work-item/vehicle/:id - Work items del vehículo");
    info!("   PUT  /api/work-item/:id - Editar campos");
    info!("   POST /api/work-item/:id/approve|decline|schedule|start|pause|resume|block|unblock|complete|cancel");
    info!("   DELETE /api/work-item/:id - Borrado explícito");
    info!("🚨 Endpoints - Detector SLA/Bottleneck:");
    info!("   GET  /api/alerts/bottlenecks - Alertas derivadas (read-only)");
    info!("   GET  /api/alerts/sla-status/:step_id - Semáforo green|yellow|red");
    info!("🔔 Endpoints - Notificaciones:");
    info!("   POST /api/notification/dispatch - Despachar evento de dominio");
    info!("   GET  /api/notification/preferences/:user_id - Preferencias");
    info!("   PUT  /api/notification/preferences/:user_id - Actualizar preferencias");
    info!("   GET  /api/notification/unread-count/:user_id - Badge de no-leídas");
    info!("   POST /api/notification/read/:id - Marcar como leída");

    // Iniciar servidor en background
    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                e
            })
    });

    // Esperar a que el servidor termine
    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Endpoint de prueba simple
async fn test_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "message": "¡Recon Tracking API funcionando correctamente!",
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
