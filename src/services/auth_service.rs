use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;

use crate::dto::auth_dto::{LoginPayload, RegisterPayload, TokenResponse};
use crate::dto::candidato_dto::CandidatoCreatePayload;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::candidato::{Candidato, StatusCandidato};
use crate::services::candidato_service::CandidatoService;
use crate::utils::crypto;

pub const TOKEN_ISSUER: &str = "cadastros-rh";
pub const DEFAULT_SCOPE: &str = "ROLE_USER";

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    candidatos: CandidatoService,
    jwt_secret: String,
    token_ttl_secs: i64,
}

pub(crate) fn issue_token(secret: &str, email: &str, ttl_secs: i64) -> Result<TokenResponse> {
    let now = chrono::Utc::now();
    let claims = Claims {
        iss: TOKEN_ISSUER.to_string(),
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now.timestamp() + ttl_secs) as usize,
        scope: DEFAULT_SCOPE.to_string(),
    };
    let access_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))?;

    Ok(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: ttl_secs,
    })
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        candidatos: CandidatoService,
        jwt_secret: String,
        token_ttl_secs: i64,
    ) -> Self {
        Self {
            pool,
            candidatos,
            jwt_secret,
            token_ttl_secs,
        }
    }

    /// Registers a login-capable candidate through the same uniqueness and
    /// hashing pipeline as POST /candidatos.
    pub async fn register(&self, payload: RegisterPayload) -> Result<Candidato> {
        let candidato = self
            .candidatos
            .criar(CandidatoCreatePayload {
                nome: payload.nome,
                cpf: payload.cpf,
                data_nascimento: None,
                email: payload.email,
                senha: Some(payload.senha),
                celular: None,
                area_interesse: None,
                experiencia_anos: 0,
                pretensao_salarial: None,
                status: StatusCandidato::Ativo,
            })
            .await?;
        Ok(candidato)
    }

    /// Resolves the identity by email and verifies the secret. Every failure
    /// path collapses into the same InvalidCredentials, so callers cannot
    /// probe which emails are registered.
    pub async fn login(&self, payload: LoginPayload) -> Result<TokenResponse> {
        let email = payload.email.trim().to_string();

        let stored_hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT senha_hash FROM candidatos WHERE email = $1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;

        let Some(Some(hash)) = stored_hash else {
            return Err(Error::InvalidCredentials);
        };

        let confere = crypto::verify_password_blocking(payload.senha, hash).await?;
        if !confere {
            return Err(Error::InvalidCredentials);
        }

        issue_token(&self.jwt_secret, &email, self.token_ttl_secs)
    }
}
