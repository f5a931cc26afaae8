use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::dto::candidato_dto::{
    CandidatoCreatePayload, CandidatoListQuery, CandidatoPatchPayload, CandidatoSenhaPayload,
};
use crate::dto::patch::Patch;
use crate::error::{Error, Result};
use crate::models::candidato::Candidato;
use crate::utils::crypto;

const COLUMNS: &str = "id, nome, cpf, data_nascimento, email, senha_hash, celular, \
     area_interesse, experiencia_anos, pretensao_salarial, status, curriculo_url, \
     curriculo_nome, curriculo_content_type, curriculo_tamanho_bytes, \
     curriculo_atualizado_em, curriculo_storage, criado_em, atualizado_em";

#[derive(Clone)]
pub struct CandidatoService {
    pool: PgPool,
}

pub struct CandidatoPage {
    pub items: Vec<Candidato>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub total_pages: i64,
}

pub(crate) fn normalize_cpf(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn field_error(field: &'static str, message: &'static str) -> Error {
    let mut errors = validator::ValidationErrors::new();
    let mut error = validator::ValidationError::new(field);
    error.message = Some(message.into());
    errors.add(field, error);
    Error::Validation(errors)
}

/// Merges the present patch cells into a copy of the existing record.
/// Returns the merged record and whether any field was actually applied.
/// The password cell is handled by the caller, since hashing is async.
pub(crate) fn apply_patch(
    existing: &Candidato,
    patch: &CandidatoPatchPayload,
) -> Result<(Candidato, bool)> {
    let mut merged = existing.clone();
    let mut applied = false;

    match &patch.nome {
        Patch::Missing => {}
        Patch::Null => return Err(field_error("nome", "Nome não pode ser removido.")),
        Patch::Value(v) => {
            merged.nome = v.clone();
            applied = true;
        }
    }
    match &patch.cpf {
        Patch::Missing | Patch::Null => {}
        Patch::Value(v) if v.trim().is_empty() => {}
        Patch::Value(v) => {
            let normalizado = normalize_cpf(v);
            if normalizado.len() != 11 {
                return Err(field_error("cpf", "CPF deve conter exatamente 11 dígitos."));
            }
            merged.cpf = normalizado;
            applied = true;
        }
    }
    match &patch.data_nascimento {
        Patch::Missing => {}
        Patch::Null => {
            merged.data_nascimento = None;
            applied = true;
        }
        Patch::Value(v) => {
            merged.data_nascimento = Some(*v);
            applied = true;
        }
    }
    match &patch.email {
        Patch::Missing | Patch::Null => {}
        Patch::Value(v) if v.trim().is_empty() => {}
        Patch::Value(v) => {
            let email = v.trim();
            if !email.validate_email() {
                return Err(field_error("email", "Email inválido."));
            }
            merged.email = email.to_string();
            applied = true;
        }
    }
    match &patch.celular {
        Patch::Missing => {}
        Patch::Null => {
            merged.celular = None;
            applied = true;
        }
        Patch::Value(v) => {
            merged.celular = Some(v.clone());
            applied = true;
        }
    }
    match &patch.area_interesse {
        Patch::Missing => {}
        Patch::Null => {
            merged.area_interesse = None;
            applied = true;
        }
        Patch::Value(v) => {
            merged.area_interesse = Some(v.clone());
            applied = true;
        }
    }
    match &patch.experiencia_anos {
        Patch::Missing => {}
        Patch::Null => {
            return Err(field_error(
                "experiencia_anos",
                "Experiência não pode ser removida.",
            ))
        }
        Patch::Value(v) => {
            if *v < 0 {
                return Err(field_error(
                    "experiencia_anos",
                    "Experiência não pode ser negativa.",
                ));
            }
            merged.experiencia_anos = *v;
            applied = true;
        }
    }
    match &patch.pretensao_salarial {
        Patch::Missing => {}
        Patch::Null => {
            merged.pretensao_salarial = None;
            applied = true;
        }
        Patch::Value(v) => {
            if v.is_sign_negative() {
                return Err(field_error(
                    "pretensao_salarial",
                    "Pretensão salarial não pode ser negativa.",
                ));
            }
            merged.pretensao_salarial = Some(*v);
            applied = true;
        }
    }
    match &patch.status {
        Patch::Missing => {}
        Patch::Null => return Err(field_error("status", "Status não pode ser removido.")),
        Patch::Value(v) => {
            merged.status = *v;
            applied = true;
        }
    }

    Ok((merged, applied))
}

/// Resolves the password cell of a patch. Blank or absent means "keep the
/// current hash"; a present value carries the same length floor as create.
pub(crate) fn senha_para_aplicar(patch: &CandidatoPatchPayload) -> Result<Option<&str>> {
    match patch
        .senha
        .value()
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
    {
        Some(s) if s.chars().count() < 8 => Err(field_error(
            "senha",
            "Senha deve ter no mínimo 8 caracteres.",
        )),
        other => Ok(other),
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CandidatoListQuery) {
    if let Some(nome) = query.nome.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND nome ILIKE ");
        qb.push_bind(format!("%{}%", nome));
    }
    if let Some(email) = query.email.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND email = ");
        qb.push_bind(email.to_string());
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }
    if query.experiencia_minima.is_some() || query.experiencia_maxima.is_some() {
        let min = query.experiencia_minima.unwrap_or(0);
        let max = query.experiencia_maxima.unwrap_or(i32::MAX);
        qb.push(" AND experiencia_anos BETWEEN ");
        qb.push_bind(min);
        qb.push(" AND ");
        qb.push_bind(max);
    }
}

// page is caller-supplied and unbounded; the offset arithmetic must not
// overflow into a negative OFFSET.
fn page_bounds(page: Option<i64>, size: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let size = size.unwrap_or(10).clamp(1, 100);
    let offset = page.saturating_sub(1).saturating_mul(size);
    (page, size, offset)
}

fn parse_sort(sort: Option<&str>) -> Result<(&'static str, &'static str)> {
    let Some(raw) = sort.filter(|s| !s.trim().is_empty()) else {
        return Ok(("nome", "ASC"));
    };
    let mut parts = raw.splitn(2, ',');
    let field = parts.next().unwrap_or("").trim();
    let direction = parts.next().unwrap_or("asc").trim();

    let column = match field {
        "nome" => "nome",
        "email" => "email",
        "experienciaAnos" => "experiencia_anos",
        "status" => "status",
        "criadoEm" => "criado_em",
        other => {
            return Err(Error::BadRequest(format!(
                "Campo de ordenação inválido: {}",
                other
            )))
        }
    };
    let direction = match direction.to_ascii_lowercase().as_str() {
        "asc" => "ASC",
        "desc" => "DESC",
        other => {
            return Err(Error::BadRequest(format!(
                "Direção de ordenação inválida: {}",
                other
            )))
        }
    };
    Ok((column, direction))
}

async fn cpf_em_uso(conn: &mut PgConnection, cpf: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM candidatos WHERE cpf = $1)")
        .bind(cpf)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

async fn email_em_uso(conn: &mut PgConnection, email: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM candidatos WHERE email = $1)")
            .bind(email)
            .fetch_one(conn)
            .await?;
    Ok(exists)
}

async fn buscar_para_atualizar(conn: &mut PgConnection, id: Uuid) -> Result<Candidato> {
    let sql = format!("SELECT {} FROM candidatos WHERE id = $1 FOR UPDATE", COLUMNS);
    sqlx::query_as::<_, Candidato>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidato não encontrado: {}", id)))
}

impl CandidatoService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn criar(&self, payload: CandidatoCreatePayload) -> Result<Candidato> {
        let cpf = normalize_cpf(&payload.cpf);
        let email = payload.email.trim().to_string();

        let senha_hash = match payload.senha.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(senha) => Some(crypto::hash_password_blocking(senha.to_string()).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        // CPF wins ties: it is always checked before email.
        if cpf_em_uso(&mut tx, &cpf).await? {
            return Err(Error::conflict("cpf", "CPF já cadastrado."));
        }
        if email_em_uso(&mut tx, &email).await? {
            return Err(Error::conflict("email", "Email já cadastrado."));
        }

        let sql = format!(
            "INSERT INTO candidatos (nome, cpf, data_nascimento, email, senha_hash, celular, \
             area_interesse, experiencia_anos, pretensao_salarial, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            COLUMNS
        );
        let candidato = sqlx::query_as::<_, Candidato>(&sql)
            .bind(&payload.nome)
            .bind(&cpf)
            .bind(payload.data_nascimento)
            .bind(&email)
            .bind(&senha_hash)
            .bind(&payload.celular)
            .bind(&payload.area_interesse)
            .bind(payload.experiencia_anos)
            .bind(payload.pretensao_salarial)
            .bind(payload.status)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(candidato)
    }

    pub async fn buscar_por_id(&self, id: Uuid) -> Result<Candidato> {
        let sql = format!("SELECT {} FROM candidatos WHERE id = $1", COLUMNS);
        sqlx::query_as::<_, Candidato>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidato não encontrado: {}", id)))
    }

    pub async fn listar(&self, query: CandidatoListQuery) -> Result<CandidatoPage> {
        let (page, size, offset) = page_bounds(query.page, query.size);
        let (sort_column, sort_direction) = parse_sort(query.sort.as_deref())?;

        let mut items_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM candidatos WHERE 1=1", COLUMNS));
        push_filters(&mut items_qb, &query);
        items_qb.push(format!(" ORDER BY {} {}", sort_column, sort_direction));
        items_qb.push(" LIMIT ");
        items_qb.push_bind(size);
        items_qb.push(" OFFSET ");
        items_qb.push_bind(offset);
        let items = items_qb
            .build_query_as::<Candidato>()
            .fetch_all(&self.pool)
            .await?;

        let mut total_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM candidatos WHERE 1=1");
        push_filters(&mut total_qb, &query);
        let total: i64 = total_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let total_pages = (total + size - 1) / size;

        Ok(CandidatoPage {
            items,
            total,
            page,
            size,
            total_pages,
        })
    }

    pub async fn atualizar(&self, id: Uuid, payload: CandidatoCreatePayload) -> Result<Candidato> {
        let cpf = normalize_cpf(&payload.cpf);
        let email = payload.email.trim().to_string();

        let senha_hash = match payload.senha.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(senha) => Some(crypto::hash_password_blocking(senha.to_string()).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let existente = buscar_para_atualizar(&mut tx, id).await?;

        // A record never conflicts with itself.
        if cpf != existente.cpf && cpf_em_uso(&mut tx, &cpf).await? {
            return Err(Error::conflict(
                "cpf",
                "Novo CPF já cadastrado para outro candidato.",
            ));
        }
        if !email.eq_ignore_ascii_case(&existente.email) && email_em_uso(&mut tx, &email).await? {
            return Err(Error::conflict(
                "email",
                "Novo Email já cadastrado para outro candidato.",
            ));
        }

        // A blank or absent password keeps the current hash.
        let senha_hash = senha_hash.or(existente.senha_hash);

        let candidato = Self::gravar_atualizacao(
            &mut tx,
            id,
            &payload.nome,
            &cpf,
            payload.data_nascimento,
            &email,
            &senha_hash,
            &payload.celular,
            &payload.area_interesse,
            payload.experiencia_anos,
            payload.pretensao_salarial,
            payload.status,
        )
        .await?;

        tx.commit().await?;
        Ok(candidato)
    }

    pub async fn atualizar_parcialmente(
        &self,
        id: Uuid,
        patch: CandidatoPatchPayload,
    ) -> Result<Candidato> {
        let mut tx = self.pool.begin().await?;
        let existente = buscar_para_atualizar(&mut tx, id).await?;

        let (merged, campos_aplicados) = apply_patch(&existente, &patch)?;

        if merged.cpf != existente.cpf && cpf_em_uso(&mut tx, &merged.cpf).await? {
            return Err(Error::conflict("cpf", "CPF já cadastrado."));
        }
        if !merged.email.eq_ignore_ascii_case(&existente.email)
            && email_em_uso(&mut tx, &merged.email).await?
        {
            return Err(Error::conflict("email", "Email já cadastrado."));
        }

        // A blank or null password in the patch is a no-op, never clear-to-blank.
        let senha_hash = match senha_para_aplicar(&patch)? {
            Some(senha) => Some(crypto::hash_password_blocking(senha.to_string()).await?),
            None => None,
        };
        let senha_aplicada = senha_hash.is_some();
        let senha_hash = senha_hash.or_else(|| existente.senha_hash.clone());

        // Nothing actually changed: skip the write so atualizado_em stays put.
        if !campos_aplicados && !senha_aplicada {
            return Ok(existente);
        }

        let candidato = Self::gravar_atualizacao(
            &mut tx,
            id,
            &merged.nome,
            &merged.cpf,
            merged.data_nascimento,
            &merged.email,
            &senha_hash,
            &merged.celular,
            &merged.area_interesse,
            merged.experiencia_anos,
            merged.pretensao_salarial,
            merged.status,
        )
        .await?;

        tx.commit().await?;
        Ok(candidato)
    }

    pub async fn alterar_senha(&self, id: Uuid, payload: CandidatoSenhaPayload) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let existente = buscar_para_atualizar(&mut tx, id).await?;

        let hash_atual = existente
            .senha_hash
            .ok_or_else(|| Error::BadRequest("Senha atual incorreta.".to_string()))?;
        let confere =
            crypto::verify_password_blocking(payload.senha_antiga, hash_atual).await?;
        if !confere {
            return Err(Error::BadRequest("Senha atual incorreta.".to_string()));
        }

        let novo_hash = crypto::hash_password_blocking(payload.senha_nova).await?;
        sqlx::query("UPDATE candidatos SET senha_hash = $2, atualizado_em = NOW() WHERE id = $1")
            .bind(id)
            .bind(&novo_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn deletar(&self, id: Uuid) -> Result<()> {
        let apagado = sqlx::query("DELETE FROM candidatos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if apagado.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Candidato não encontrado: {}", id)));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn gravar_atualizacao(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        nome: &str,
        cpf: &str,
        data_nascimento: Option<chrono::NaiveDate>,
        email: &str,
        senha_hash: &Option<String>,
        celular: &Option<String>,
        area_interesse: &Option<String>,
        experiencia_anos: i32,
        pretensao_salarial: Option<rust_decimal::Decimal>,
        status: crate::models::candidato::StatusCandidato,
    ) -> Result<Candidato> {
        let sql = format!(
            "UPDATE candidatos SET nome = $2, cpf = $3, data_nascimento = $4, email = $5, \
             senha_hash = $6, celular = $7, area_interesse = $8, experiencia_anos = $9, \
             pretensao_salarial = $10, status = $11, atualizado_em = NOW() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let candidato = sqlx::query_as::<_, Candidato>(&sql)
            .bind(id)
            .bind(nome)
            .bind(cpf)
            .bind(data_nascimento)
            .bind(email)
            .bind(senha_hash)
            .bind(celular)
            .bind(area_interesse)
            .bind(experiencia_anos)
            .bind(pretensao_salarial)
            .bind(status)
            .fetch_one(&mut **tx)
            .await?;
        Ok(candidato)
    }
}
