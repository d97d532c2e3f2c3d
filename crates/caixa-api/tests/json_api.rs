//! JSON API driven through the router against the in-memory backend.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use caixa_api::{AppState, router};
use caixa_core::FolderId;
use caixa_store::memory::Operation;
use caixa_store::{MemoryBackend, Resolver};
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_router() -> (Arc<MemoryBackend>, Router) {
    let backend = Arc::new(MemoryBackend::new());
    let resolver = Resolver::new(backend.clone(), FolderId::new("clientes"));
    (backend, router(AppState::new(resolver)))
}

async fn request(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value), String> {
    let mut builder = Request::builder().method(method).uri(uri);
    let req = if let Some(payload) = body {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        let bytes =
            serde_json::to_vec(&payload).map_err(|err| format!("serialize request body: {err}"))?;
        builder
            .body(Body::from(bytes))
            .map_err(|err| format!("build request: {err}"))?
    } else {
        builder
            .body(Body::empty())
            .map_err(|err| format!("build request: {err}"))?
    };

    let response = router
        .clone()
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))?;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .map_err(|err| format!("read response body: {err}"))?;
    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|err| format!("parse response body: {err}"))?
    };
    Ok((status, parsed))
}

#[tokio::test]
async fn health_is_ok() -> Result<(), String> {
    let (_, router) = test_router();
    let (status, body) = request(&router, Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
    Ok(())
}

#[tokio::test]
async fn enter_client_provisions_once() -> Result<(), String> {
    let (backend, router) = test_router();

    let (status, first) = request(
        &router,
        Method::POST,
        "/api/clients",
        Some(json!({ "name": "Acme" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["name"], "Acme");
    assert_eq!(first["created"], true);

    let (status, second) = request(
        &router,
        Method::POST,
        "/api/clients",
        Some(json!({ "name": "Acme" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], false);
    assert_eq!(second["container_id"], first["container_id"]);
    assert_eq!(backend.container_count(), 1);
    Ok(())
}

#[tokio::test]
async fn client_names_match_exactly() -> Result<(), String> {
    let (backend, router) = test_router();

    let (status, padded) = request(
        &router,
        Method::POST,
        "/api/clients",
        Some(json!({ "name": " Acme " })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(padded["name"], " Acme ");

    let (status, plain) = request(
        &router,
        Method::POST,
        "/api/clients",
        Some(json!({ "name": "Acme" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plain["created"], true);
    assert_ne!(plain["container_id"], padded["container_id"]);
    assert_eq!(backend.container_count(), 2);
    Ok(())
}

#[tokio::test]
async fn empty_client_name_is_rejected() -> Result<(), String> {
    let (backend, router) = test_router();
    let (status, body) = request(
        &router,
        Method::POST,
        "/api/clients",
        Some(json!({ "name": "" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(backend.container_count(), 0);
    Ok(())
}

#[tokio::test]
async fn lookup_failure_is_bad_gateway() -> Result<(), String> {
    let (backend, router) = test_router();
    backend.fail_next(Operation::Find);

    let (status, body) = request(
        &router,
        Method::POST,
        "/api/clients",
        Some(json!({ "name": "Acme" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "LOOKUP_FAILED");
    assert_eq!(backend.container_count(), 0);
    Ok(())
}

#[tokio::test]
async fn counterparty_append_then_read() -> Result<(), String> {
    let (_, router) = test_router();

    let (status, row) = request(
        &router,
        Method::POST,
        "/api/clients/Acme/counterparties",
        Some(json!({ "name": "Bia", "kind": "Cliente", "contact": "bia@example.com" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row["Nome"], "Bia");

    let (status, table) =
        request(&router, Method::GET, "/api/clients/Acme/counterparties", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["columns"], json!(["Nome", "Tipo", "Contato"]));
    assert_eq!(table["rows"], json!([["Bia", "Cliente", "bia@example.com"]]));
    Ok(())
}

#[tokio::test]
async fn counterparty_kind_must_be_known() -> Result<(), String> {
    let (_, router) = test_router();

    let (status, body) = request(
        &router,
        Method::POST,
        "/api/clients/Acme/counterparties",
        Some(json!({ "name": "Bia", "kind": "banana" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, table) = request(&router, Method::GET, "/api/clients/Acme/counterparties", None).await?;
    assert_eq!(table["rows"], json!([]));
    Ok(())
}

#[tokio::test]
async fn delete_removes_every_match() -> Result<(), String> {
    let (_, router) = test_router();
    for (amount, description) in [("1", "A"), ("2", "B"), ("3", "A")] {
        let (status, _) = request(
            &router,
            Method::POST,
            "/api/clients/Acme/income",
            Some(json!({ "amount": amount, "date": "2024-01-01", "description": description })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = request(
        &router,
        Method::DELETE,
        "/api/clients/Acme/income?value=A",
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 2);

    let (_, table) = request(&router, Method::GET, "/api/clients/Acme/income", None).await?;
    assert_eq!(table["rows"], json!([["2.00", "2024-01-01", "B"]]));
    Ok(())
}

#[tokio::test]
async fn balance_totals_and_metrics() -> Result<(), String> {
    let (_, router) = test_router();
    for (table, amount) in [("income", json!("10.00")), ("income", json!(5.5)), ("expenses", json!(3))] {
        let (status, _) = request(
            &router,
            Method::POST,
            &format!("/api/clients/Acme/{table}"),
            Some(json!({ "amount": amount, "date": "2024-01-01", "description": "x" })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = request(&router, Method::GET, "/api/clients/Acme/balance", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_income"], "15.50");
    assert_eq!(body["total_expense"], "3.00");
    assert_eq!(body["balance"], "12.50");
    assert_eq!(
        body["metrics"],
        json!([
            { "label": "Total de Receitas Lançadas", "value": "R$ 15.50" },
            { "label": "Total de Despesas Lançadas", "value": "R$ 3.00" },
            { "label": "Saldo", "value": "R$ 12.50" },
        ])
    );
    assert_eq!(body["warnings"], json!([]));
    Ok(())
}

#[tokio::test]
async fn amounts_above_the_cap_are_rejected() -> Result<(), String> {
    let (_, router) = test_router();

    let (status, _) = request(
        &router,
        Method::POST,
        "/api/clients/Acme/income",
        Some(json!({ "amount": "79228162514264337593543950335", "date": "2024-01-01" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        let (status, _) = request(
            &router,
            Method::POST,
            "/api/clients/Acme/income",
            Some(json!({ "amount": "1000000000000", "date": "2024-01-01" })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = request(&router, Method::GET, "/api/clients/Acme/balance", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_income"], "2000000000000.00");
    Ok(())
}

#[tokio::test]
async fn invalid_input_is_rejected() -> Result<(), String> {
    let (_, router) = test_router();

    let (status, body) = request(
        &router,
        Method::POST,
        "/api/clients/Acme/expenses",
        Some(json!({ "amount": "-4", "date": "2024-01-01" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = request(
        &router,
        Method::POST,
        "/api/clients/Acme/targets",
        Some(json!({ "income_target": 100, "expense_target": 50, "date": "01/02/2024" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, table) = request(&router, Method::GET, "/api/clients/Acme/expenses", None).await?;
    assert_eq!(table["rows"], json!([]));
    Ok(())
}

#[tokio::test]
async fn unknown_paths_are_not_found() -> Result<(), String> {
    let (_, router) = test_router();

    let (status, body) =
        request(&router, Method::GET, "/api/clients/Acme/invoices", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = request(&router, Method::GET, "/nowhere", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
