//! Repositorios de acceso a datos
//! 
//! CRUD sobre PostgreSQL vía sqlx. Las operaciones multi-fila
//! (reorder, delete con compactación, move de vehículo) son transaccionales.

pub mod step_repository;
pub mod vehicle_state_repository;
pub mod work_item_repository;
pub mod notification_repository;
