use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::candidato_dto::validate_cpf;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "Nome é obrigatório."))]
    pub nome: String,
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: String,
    #[validate(email(message = "Email inválido."))]
    pub email: String,
    #[validate(length(min = 8, message = "Senha deve ter no mínimo 8 caracteres."))]
    pub senha: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "Email inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "Senha é obrigatória."))]
    pub senha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
