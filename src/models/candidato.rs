use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Candidate lifecycle status, stored as the `status_candidato` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "status_candidato")]
pub enum StatusCandidato {
    #[serde(rename = "CANDIDATO")]
    #[sqlx(rename = "CANDIDATO")]
    Candidato,
    #[serde(rename = "TRIAGEM")]
    #[sqlx(rename = "TRIAGEM")]
    Triagem,
    #[serde(rename = "APROVADO")]
    #[sqlx(rename = "APROVADO")]
    Aprovado,
    #[serde(rename = "REPROVADO")]
    #[sqlx(rename = "REPROVADO")]
    Reprovado,
    #[serde(rename = "ATIVO")]
    #[sqlx(rename = "ATIVO")]
    Ativo,
    #[serde(rename = "EM_ENTREVISTA")]
    #[sqlx(rename = "EM_ENTREVISTA")]
    EmEntrevista,
}

/// Row model for the `candidatos` table. The password hash and the resume
/// metadata never leave the service layer; outward representations go
/// through `CandidatoResponse`.
#[derive(Debug, Clone, FromRow)]
pub struct Candidato {
    pub id: Uuid,
    pub nome: String,
    pub cpf: String,
    pub data_nascimento: Option<NaiveDate>,
    pub email: String,
    pub senha_hash: Option<String>,
    pub celular: Option<String>,
    pub area_interesse: Option<String>,
    pub experiencia_anos: i32,
    pub pretensao_salarial: Option<Decimal>,
    pub status: StatusCandidato,
    pub curriculo_url: Option<String>,
    pub curriculo_nome: Option<String>,
    pub curriculo_content_type: Option<String>,
    pub curriculo_tamanho_bytes: Option<i64>,
    pub curriculo_atualizado_em: Option<DateTime<Utc>>,
    pub curriculo_storage: Option<String>,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}
