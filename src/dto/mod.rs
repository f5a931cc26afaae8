pub mod auth_dto;
pub mod candidato_dto;
pub mod patch;
