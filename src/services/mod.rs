pub mod auth_service;
pub mod candidato_service;
