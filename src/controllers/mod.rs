//! Controllers de la API
//! 
//! Orquestación por recurso: validar, cargar, computar el estado nuevo
//! completo (lógica pura), persistir atómicamente y emitir eventos.

pub mod step_controller;
pub mod vehicle_controller;
pub mod work_item_controller;
pub mod alert_controller;
pub mod notification_controller;
