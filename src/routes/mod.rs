pub mod auth;
pub mod candidatos;
pub mod health;
