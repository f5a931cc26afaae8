use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value as JsonValue};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { field: String, message: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn conflict(field: &str, message: &str) -> Self {
        Error::Conflict {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Validation(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn validation_fields(errors: &validator::ValidationErrors) -> Vec<JsonValue> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| {
                json!({
                    "field": field,
                    "message": e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                    "rejectedValue": e.params.get("value").cloned(),
                })
            })
        })
        .collect()
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let body = match &self {
            Error::Validation(errors) => json!({
                "title": "Erro de validação",
                "status": status.as_u16(),
                "detail": "Um ou mais campos estão inválidos.",
                "fields": validation_fields(errors),
            }),
            Error::Conflict { field, message } => json!({
                "title": "Conflito de dados",
                "status": status.as_u16(),
                "detail": message,
                "field": field,
            }),
            Error::NotFound(msg) => json!({
                "title": "Recurso não encontrado",
                "status": status.as_u16(),
                "detail": msg,
            }),
            Error::BadRequest(msg) => json!({
                "title": "Requisição inválida",
                "status": status.as_u16(),
                "detail": msg,
            }),
            Error::Json(e) => json!({
                "title": "Requisição inválida",
                "status": status.as_u16(),
                "detail": e.to_string(),
            }),
            Error::Unauthorized(msg) => json!({
                "title": "Acesso não autorizado",
                "status": status.as_u16(),
                "detail": msg,
            }),
            Error::InvalidCredentials => json!({
                "title": "Acesso não autorizado",
                "status": status.as_u16(),
                "detail": "Credenciais inválidas.",
            }),
            other => {
                tracing::error!(error = %other, "unexpected error");
                json!({
                    "title": "Erro interno",
                    "status": status.as_u16(),
                    "detail": "Ocorreu um erro inesperado. Tente novamente mais tarde.",
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

// The store-level unique constraints are the authoritative uniqueness
// invariant; the service pre-checks only exist for friendlier messages.
// A 23505 rejection must surface as the same Conflict the pre-check raises.
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Recurso não encontrado".to_string()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                let constraint = db.constraint().unwrap_or_default();
                if constraint.contains("cpf") {
                    Error::conflict("cpf", "CPF já cadastrado.")
                } else {
                    Error::conflict("email", "Email já cadastrado.")
                }
            }
            other => Error::Database(other),
        }
    }
}
