use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

fn candidato_a() -> JsonValue {
    json!({
        "nome": "Ana Souza",
        "cpf": "111.222.333-44",
        "dataNascimento": "1995-04-12",
        "email": "a@x.com",
        "senha": "senha-forte-1",
        "celular": "11999990000",
        "areaInteresse": "Backend",
        "experienciaAnos": 5,
        "pretensaoSalarial": 8000.0,
        "status": "CANDIDATO"
    })
}

fn candidato_b() -> JsonValue {
    json!({
        "nome": "Bruno Dias",
        "cpf": "22233344455",
        "email": "b@x.com",
        "senha": "senha-forte-2",
        "experienciaAnos": 10,
        "status": "APROVADO"
    })
}

// End-to-end pass over the whole candidate lifecycle. Needs a reachable
// Postgres; skipped when DATABASE_URL is not configured.
#[tokio::test]
async fn candidatos_api_end_to_end() {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping candidatos_api_end_to_end");
        return;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    let _ = cadastros_rh::config::init_config();

    let pool = cadastros_rh::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
    sqlx::query("DELETE FROM candidatos")
        .execute(&pool)
        .await
        .expect("clean slate");

    let app = cadastros_rh::build_router(cadastros_rh::AppState::new(pool.clone()));

    // Unauthenticated access to a protected route is rejected outright.
    let (status, _) = send(&app, "GET", "/candidatos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Creation is public, returns 201 and normalizes the CPF.
    let (status, created_a) = send(&app, "POST", "/candidatos", None, Some(candidato_a())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created_a["cpf"], "11122233344");
    assert!(created_a.get("senha").is_none());
    assert!(created_a.get("senhaHash").is_none());
    let id_a = created_a["id"].as_str().unwrap().to_string();

    let (status, created_b) = send(&app, "POST", "/candidatos", None, Some(candidato_b())).await;
    assert_eq!(status, StatusCode::CREATED);
    let id_b = created_b["id"].as_str().unwrap().to_string();

    // Duplicate CPF conflicts, and CPF wins when both fields collide.
    let mut dup = candidato_b();
    dup["email"] = json!("outro@x.com");
    let (status, body) = send(&app, "POST", "/candidatos", None, Some(dup)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["field"], "cpf");

    let mut dup = candidato_b();
    dup["cpf"] = json!("33344455566");
    let (status, body) = send(&app, "POST", "/candidatos", None, Some(dup)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["field"], "email");

    // Malformed input is a 400 with per-field details.
    let mut invalid = candidato_a();
    invalid["cpf"] = json!("123");
    invalid["email"] = json!("nao-e-email");
    let (status, body) = send(&app, "POST", "/candidatos", None, Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"].as_array().map_or(false, |f| !f.is_empty()));

    // Login with A's credentials to reach the protected surface.
    let (status, token_body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "a@x.com", "senha": "senha-forte-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token_body["token_type"], "Bearer");
    assert_eq!(token_body["expires_in"], 3600);
    let token = token_body["access_token"].as_str().unwrap().to_string();
    let token = token.as_str();

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "a@x.com", "senha": "senha-errada"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // get(id) returns the created record.
    let (status, fetched) = send(
        &app,
        "GET",
        &format!("/candidatos/{}", id_a),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created_a["id"]);
    assert_eq!(fetched["nome"], "Ana Souza");
    assert_eq!(fetched["criadoEm"], created_a["criadoEm"]);

    let (status, _) = send(
        &app,
        "GET",
        "/candidatos/00000000-0000-0000-0000-000000000000",
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Filtered listing: experience range [3,7] matches exactly A.
    let (status, page) = send(
        &app,
        "GET",
        "/candidatos?experienciaMinima=3&experienciaMaxima=7",
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"].as_str(), Some(id_a.as_str()));

    // Name filter is a case-insensitive substring match.
    let (status, page) = send(&app, "GET", "/candidatos?nome=ana", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    // Status filter is exact.
    let (status, page) = send(
        &app,
        "GET",
        "/candidatos?status=APROVADO",
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"].as_str(), Some(id_b.as_str()));

    // Unfiltered listing sorts by name ascending by default.
    let (status, page) = send(&app, "GET", "/candidatos", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["nome"], "Ana Souza");
    assert_eq!(page["items"][1]["nome"], "Bruno Dias");
    assert_eq!(page["size"], 10);

    // Full replace: everything overwritten, id and criadoEm preserved,
    // atualizadoEm re-stamped.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let mut replacement = candidato_a();
    replacement["nome"] = json!("Ana Maria Souza");
    replacement["experienciaAnos"] = json!(6);
    replacement["senha"] = json!("");
    let (status, replaced) = send(
        &app,
        "PUT",
        &format!("/candidatos/{}", id_a),
        Some(token),
        Some(replacement),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["nome"], "Ana Maria Souza");
    assert_eq!(replaced["experienciaAnos"], 6);
    assert_eq!(replaced["id"], created_a["id"]);
    assert_eq!(replaced["criadoEm"], created_a["criadoEm"]);
    assert_ne!(replaced["atualizadoEm"], created_a["atualizadoEm"]);

    // Replace keeping a blank password must not invalidate the stored hash.
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "a@x.com", "senha": "senha-forte-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Replacing with an email already owned by someone else conflicts.
    let mut stolen = candidato_a();
    stolen["email"] = json!("b@x.com");
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/candidatos/{}", id_a),
        Some(token),
        Some(stolen),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["field"], "email");

    // Merge-patch: only the listed field changes.
    let (status, patched) = send(
        &app,
        "PATCH",
        &format!("/candidatos/{}", id_a),
        Some(token),
        Some(json!({"areaInteresse": "Plataforma"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["areaInteresse"], "Plataforma");
    assert_eq!(patched["nome"], "Ana Maria Souza");
    assert_eq!(patched["experienciaAnos"], 6);

    // Explicit null clears an optional field.
    let (status, patched) = send(
        &app,
        "PATCH",
        &format!("/candidatos/{}", id_a),
        Some(token),
        Some(json!({"celular": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["celular"], JsonValue::Null);

    // Empty patch is a pure no-op: atualizadoEm must not move.
    let before = patched["atualizadoEm"].clone();
    let (status, unpatched) = send(
        &app,
        "PATCH",
        &format!("/candidatos/{}", id_a),
        Some(token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unpatched["atualizadoEm"], before);

    // Patched email and password go through the same checks as a replace.
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/candidatos/{}", id_a),
        Some(token),
        Some(json!({"email": "nao-e-email"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/candidatos/{}", id_a),
        Some(token),
        Some(json!({"senha": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Explicit null on a required field is rejected.
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/candidatos/{}", id_a),
        Some(token),
        Some(json!({"nome": null})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Password change: wrong old secret is a 400 and leaves the hash alone.
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/candidatos/{}/senha", id_a),
        Some(token),
        Some(json!({"senhaAntiga": "senha-errada", "senhaNova": "senha-nova-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/candidatos/{}/senha", id_a),
        Some(token),
        Some(json!({"senhaAntiga": "senha-forte-1", "senhaNova": "senha-nova-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Old password no longer logs in, the new one does.
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "a@x.com", "senha": "senha-forte-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "a@x.com", "senha": "senha-nova-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Registration creates an active login-capable candidate.
    let (status, registered) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "nome": "Carla Nunes",
            "cpf": "44455566677",
            "email": "carla@x.com",
            "senha": "senha-forte-3"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["status"], "ATIVO");

    // Delete is hard and deleting twice is a 404, never a no-op.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/candidatos/{}", id_b),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(
        &app,
        "GET",
        &format!("/candidatos/{}", id_b),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/candidatos/{}", id_b),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
