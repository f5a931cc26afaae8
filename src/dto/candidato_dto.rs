use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::dto::patch::Patch;
use crate::models::candidato::{Candidato, StatusCandidato};
use crate::services::candidato_service::CandidatoPage;

pub fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    let digits = cpf.chars().filter(|c| c.is_ascii_digit()).count();
    if digits != 11 {
        let mut err = ValidationError::new("cpf");
        err.message = Some("CPF deve conter exatamente 11 dígitos.".into());
        return Err(err);
    }
    Ok(())
}

/// A blank password means "none provided" (create) or "keep the current
/// hash" (replace), so only non-blank values carry the length floor.
pub fn validate_senha(senha: &str) -> Result<(), ValidationError> {
    if !senha.trim().is_empty() && senha.chars().count() < 8 {
        let mut err = ValidationError::new("senha");
        err.message = Some("Senha deve ter no mínimo 8 caracteres.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_pretensao(valor: &Decimal) -> Result<(), ValidationError> {
    if valor.is_sign_negative() {
        let mut err = ValidationError::new("pretensao_salarial");
        err.message = Some("Pretensão salarial não pode ser negativa.".into());
        return Err(err);
    }
    Ok(())
}

/// Body of POST /candidatos and PUT /candidatos/{id}. The same shape serves
/// both, as a full replacement carries every mutable field.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandidatoCreatePayload {
    #[validate(length(min = 1, message = "Nome é obrigatório."))]
    pub nome: String,
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: String,
    pub data_nascimento: Option<NaiveDate>,
    #[validate(email(message = "Email inválido."))]
    pub email: String,
    #[validate(custom(function = "validate_senha"))]
    pub senha: Option<String>,
    pub celular: Option<String>,
    pub area_interesse: Option<String>,
    #[validate(range(min = 0, message = "Experiência não pode ser negativa."))]
    pub experiencia_anos: i32,
    #[validate(custom(function = "validate_pretensao"))]
    pub pretensao_salarial: Option<Decimal>,
    pub status: StatusCandidato,
}

/// Body of PATCH /candidatos/{id} (merge-patch). Every cell records whether
/// the field was present in the document; absent cells are strict no-ops.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidatoPatchPayload {
    pub nome: Patch<String>,
    pub cpf: Patch<String>,
    pub data_nascimento: Patch<NaiveDate>,
    pub email: Patch<String>,
    pub senha: Patch<String>,
    pub celular: Patch<String>,
    pub area_interesse: Patch<String>,
    pub experiencia_anos: Patch<i32>,
    pub pretensao_salarial: Patch<Decimal>,
    pub status: Patch<StatusCandidato>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandidatoSenhaPayload {
    #[validate(length(min = 1, message = "Senha antiga é obrigatória."))]
    pub senha_antiga: String,
    #[validate(length(min = 8, message = "Senha nova deve ter no mínimo 8 caracteres."))]
    pub senha_nova: String,
}

/// Outward representation. The password hash and resume metadata are
/// deliberately not part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatoResponse {
    pub id: uuid::Uuid,
    pub nome: String,
    pub cpf: String,
    pub data_nascimento: Option<NaiveDate>,
    pub email: String,
    pub celular: Option<String>,
    pub area_interesse: Option<String>,
    pub experiencia_anos: i32,
    pub pretensao_salarial: Option<Decimal>,
    pub status: StatusCandidato,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

impl From<Candidato> for CandidatoResponse {
    fn from(c: Candidato) -> Self {
        Self {
            id: c.id,
            nome: c.nome,
            cpf: c.cpf,
            data_nascimento: c.data_nascimento,
            email: c.email,
            celular: c.celular,
            area_interesse: c.area_interesse,
            experiencia_anos: c.experiencia_anos,
            pretensao_salarial: c.pretensao_salarial,
            status: c.status,
            criado_em: c.criado_em,
            atualizado_em: c.atualizado_em,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidatoListQuery {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub status: Option<StatusCandidato>,
    pub experiencia_minima: Option<i32>,
    pub experiencia_maxima: Option<i32>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// `campo,direcao`, e.g. `nome,asc`. Defaults to name ascending.
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatoPageResponse {
    pub items: Vec<CandidatoResponse>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub total_pages: i64,
}

impl From<CandidatoPage> for CandidatoPageResponse {
    fn from(page: CandidatoPage) -> Self {
        Self {
            items: page.items.into_iter().map(CandidatoResponse::from).collect(),
            total: page.total,
            page: page.page,
            size: page.size,
            total_pages: page.total_pages,
        }
    }
}
