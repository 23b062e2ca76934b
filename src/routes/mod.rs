//! Routers de la API
//! 
//! Un router de Axum por recurso, nesteados desde main.

pub mod step_routes;
pub mod vehicle_routes;
pub mod work_item_routes;
pub mod alert_routes;
pub mod notification_routes;
