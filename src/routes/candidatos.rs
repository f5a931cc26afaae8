use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::candidato_dto::{
        CandidatoCreatePayload, CandidatoListQuery, CandidatoPageResponse, CandidatoPatchPayload,
        CandidatoResponse, CandidatoSenhaPayload,
    },
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn listar(
    State(state): State<AppState>,
    Query(query): Query<CandidatoListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.candidato_service.listar(query).await?;
    Ok(Json(CandidatoPageResponse::from(page)))
}

#[axum::debug_handler]
pub async fn buscar_por_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidato = state.candidato_service.buscar_por_id(id).await?;
    Ok(Json(CandidatoResponse::from(candidato)))
}

#[axum::debug_handler]
pub async fn criar(
    State(state): State<AppState>,
    Json(payload): Json<CandidatoCreatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let candidato = state.candidato_service.criar(payload).await?;
    let location = format!("/candidatos/{}", candidato.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CandidatoResponse::from(candidato)),
    ))
}

#[axum::debug_handler]
pub async fn atualizar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CandidatoCreatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let candidato = state.candidato_service.atualizar(id, payload).await?;
    Ok(Json(CandidatoResponse::from(candidato)))
}

// Accepts application/merge-patch+json as well as plain application/json;
// axum's Json extractor takes any application/*+json media type.
#[axum::debug_handler]
pub async fn atualizar_parcialmente(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CandidatoPatchPayload>,
) -> Result<impl IntoResponse> {
    let candidato = state
        .candidato_service
        .atualizar_parcialmente(id, patch)
        .await?;
    Ok(Json(CandidatoResponse::from(candidato)))
}

#[axum::debug_handler]
pub async fn alterar_senha(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CandidatoSenhaPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.candidato_service.alterar_senha(id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn deletar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.candidato_service.deletar(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
