use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
    pub scope: String,
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[crate::services::auth_service::TOKEN_ISSUER]);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

fn unauthorized(detail: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "title": "Acesso não autorizado",
            "status": 401,
            "detail": detail,
        })),
    )
        .into_response()
}

/// Routes reachable without credentials: candidate self-registration, login
/// and the health probe. Everything else requires a bearer token.
pub fn is_public(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS {
        return true;
    }
    matches!(
        (method, path),
        (&Method::GET, "/health")
            | (&Method::POST, "/candidatos")
            | (&Method::POST, "/auth/login")
            | (&Method::POST, "/auth/register")
    )
}

/// Authentication gate applied to the whole router: requests to protected
/// routes must carry a verifiable bearer token before any handler runs.
pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    if is_public(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("Token de autenticação ausente.");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("Cabeçalho de autorização inválido.");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("Esquema de autorização não suportado.");
    };

    let config = crate::config::get_config();
    match decode_token(&config.jwt_secret, token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => unauthorized("Token de autenticação inválido ou expirado."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_routes_are_whitelisted() {
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::POST, "/candidatos"));
        assert!(is_public(&Method::POST, "/auth/login"));
        assert!(is_public(&Method::POST, "/auth/register"));
        assert!(is_public(&Method::OPTIONS, "/candidatos/abc"));
    }

    #[test]
    fn everything_else_is_protected() {
        assert!(!is_public(&Method::GET, "/candidatos"));
        assert!(!is_public(&Method::GET, "/candidatos/123"));
        assert!(!is_public(&Method::PUT, "/candidatos/123"));
        assert!(!is_public(&Method::PATCH, "/candidatos/123"));
        assert!(!is_public(&Method::PATCH, "/candidatos/123/senha"));
        assert!(!is_public(&Method::DELETE, "/candidatos/123"));
    }
}
