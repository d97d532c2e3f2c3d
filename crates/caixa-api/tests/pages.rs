//! Server-rendered pages: cadastro, form actions and redirects.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use caixa_api::{AppState, router};
use caixa_core::FolderId;
use caixa_store::memory::Operation;
use caixa_store::{MemoryBackend, Resolver};
use tower::ServiceExt;

struct Page {
    status: StatusCode,
    location: Option<String>,
    html: String,
}

fn test_router() -> (Arc<MemoryBackend>, Router) {
    let backend = Arc::new(MemoryBackend::new());
    let resolver = Resolver::new(backend.clone(), FolderId::new("clientes"));
    (backend, router(AppState::new(resolver)))
}

async fn send(router: &Router, req: Request<Body>) -> Result<Page, String> {
    let response = router
        .clone()
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))?;
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .map_err(|err| format!("read response body: {err}"))?;
    let html = String::from_utf8(body.to_vec()).map_err(|err| format!("utf-8 body: {err}"))?;
    Ok(Page {
        status,
        location,
        html,
    })
}

async fn get(router: &Router, uri: &str) -> Result<Page, String> {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .map_err(|err| format!("build request: {err}"))?;
    send(router, req).await
}

async fn post(router: &Router, uri: &str, fields: &[(&str, &str)]) -> Result<Page, String> {
    let body = serde_urlencoded::to_string(fields).map_err(|err| format!("encode form: {err}"))?;
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .map_err(|err| format!("build request: {err}"))?;
    send(router, req).await
}

#[tokio::test]
async fn cadastro_screen_without_client() -> Result<(), String> {
    let (_, router) = test_router();
    let page = get(&router, "/").await?;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.html.contains("Dashboard Financeiro - Cadastro"));
    assert!(page.html.contains("Digite o nome da sua empresa ou seu nome completo"));
    Ok(())
}

#[tokio::test]
async fn empty_name_warns_and_creates_nothing() -> Result<(), String> {
    let (backend, router) = test_router();
    let page = post(&router, "/entrar", &[("nome", "")]).await?;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.html.contains("Por favor, preencha o campo antes de continuar."));
    assert_eq!(backend.container_count(), 0);
    Ok(())
}

#[tokio::test]
async fn entering_redirects_to_dashboard() -> Result<(), String> {
    let (backend, router) = test_router();
    let page = post(&router, "/entrar", &[("nome", "Acme Ltda")]).await?;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/?cliente=Acme+Ltda"));
    assert_eq!(backend.container_count(), 1);

    let dashboard = get(&router, "/?cliente=Acme+Ltda").await?;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert!(dashboard.html.contains("Ir para:"));
    assert!(dashboard.html.contains("Cadastro de Clientes e Fornecedores"));
    assert!(!dashboard.html.contains("Excluir Cadastro"));
    Ok(())
}

#[tokio::test]
async fn lookup_failure_is_shown_on_cadastro() -> Result<(), String> {
    let (backend, router) = test_router();
    backend.fail_next(Operation::Find);
    let page = post(&router, "/entrar", &[("nome", "Acme")]).await?;
    assert_eq!(page.status, StatusCode::BAD_GATEWAY);
    assert!(page.html.contains("Erro ao carregar ou criar a planilha:"));
    Ok(())
}

#[tokio::test]
async fn counterparty_save_and_delete() -> Result<(), String> {
    let (_, router) = test_router();
    let saved = post(
        &router,
        "/clientes",
        &[
            ("cliente", "Acme"),
            ("nome", "Bia"),
            ("tipo", "Fornecedor"),
            ("contato", "bia@example.com"),
        ],
    )
    .await?;
    assert_eq!(saved.status, StatusCode::SEE_OTHER);
    let location = saved.location.ok_or("missing redirect")?;
    assert_eq!(location, "/?cliente=Acme&aba=clientes&aviso=cadastro-salvo");

    let page = get(&router, &location).await?;
    assert!(page.html.contains("Cadastro salvo com sucesso!"));
    assert!(page.html.contains("<td>Fornecedor</td>"));
    assert!(page.html.contains("Selecione um cadastro para excluir:"));

    let deleted = post(&router, "/clientes/excluir", &[("cliente", "Acme"), ("valor", "Bia")]).await?;
    assert_eq!(
        deleted.location.as_deref(),
        Some("/?cliente=Acme&aba=clientes&aviso=cadastro-excluido")
    );
    let page = get(&router, "/?cliente=Acme&aba=clientes&aviso=cadastro-excluido").await?;
    assert!(page.html.contains("Cadastro excluído!"));
    assert!(!page.html.contains("<td>Bia</td>"));
    Ok(())
}

#[tokio::test]
async fn blank_counterparty_name_can_be_deleted() -> Result<(), String> {
    let (_, router) = test_router();
    let saved = post(
        &router,
        "/clientes",
        &[("cliente", "Acme"), ("nome", ""), ("tipo", "Cliente"), ("contato", "x")],
    )
    .await?;
    assert_eq!(saved.status, StatusCode::SEE_OTHER);

    let page = get(&router, "/?cliente=Acme&aba=clientes").await?;
    assert!(page.html.contains(r#"<option value=""></option>"#));

    let deleted = post(&router, "/clientes/excluir", &[("cliente", "Acme"), ("valor", "")]).await?;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    let page = get(&router, "/?cliente=Acme&aba=clientes").await?;
    assert!(!page.html.contains("<td>x</td>"));
    assert!(!page.html.contains("Excluir Cadastro"));
    Ok(())
}

#[tokio::test]
async fn unknown_counterparty_kind_is_a_warning() -> Result<(), String> {
    let (_, router) = test_router();
    let page = post(
        &router,
        "/clientes",
        &[("cliente", "Acme"), ("nome", "Bia"), ("tipo", "banana"), ("contato", "")],
    )
    .await?;
    assert_eq!(page.status, StatusCode::BAD_REQUEST);
    assert!(page.html.contains("notice warning"));
    assert!(page.html.contains("Cliente ou Fornecedor"));
    assert!(!page.html.contains("<td>Bia</td>"));
    Ok(())
}

#[tokio::test]
async fn targets_reject_bad_amounts() -> Result<(), String> {
    let (_, router) = test_router();
    let page = post(
        &router,
        "/metas",
        &[
            ("cliente", "Acme"),
            ("meta_receita", "-10"),
            ("meta_despesa", "5"),
            ("data", "2024-12-31"),
        ],
    )
    .await?;
    assert_eq!(page.status, StatusCode::BAD_REQUEST);
    assert!(page.html.contains("Meta de Receita: o valor não pode ser negativo."));
    assert!(page.html.contains("notice warning"));

    let saved = post(
        &router,
        "/metas",
        &[
            ("cliente", "Acme"),
            ("meta_receita", "1000"),
            ("meta_despesa", "400.5"),
            ("data", "2024-12-31"),
        ],
    )
    .await?;
    assert_eq!(
        saved.location.as_deref(),
        Some("/?cliente=Acme&aba=metas&aviso=metas-salvas")
    );
    let page = get(&router, "/?cliente=Acme&aba=metas").await?;
    assert!(page.html.contains("<td>400.50</td>"));
    assert!(page.html.contains(r#"<option value="2024-12-31">"#));
    Ok(())
}

#[tokio::test]
async fn balance_tab_shows_metrics_and_chart() -> Result<(), String> {
    let (_, router) = test_router();
    for (uri, value, date, description) in [
        ("/receitas", "10.00", "2024-01-01", "venda"),
        ("/receitas", "5.50", "2024-01-02", "venda"),
        ("/despesas", "3.00", "2024-01-01", "aluguel"),
    ] {
        let page = post(
            &router,
            uri,
            &[
                ("cliente", "Acme"),
                ("valor", value),
                ("data", date),
                ("descricao", description),
            ],
        )
        .await?;
        assert_eq!(page.status, StatusCode::SEE_OTHER);
    }

    let page = get(&router, "/?cliente=Acme&aba=balanco").await?;
    assert!(page.html.contains("Total de Receitas Lançadas"));
    assert!(page.html.contains("R$ 15.50"));
    assert!(page.html.contains("R$ 3.00"));
    assert!(page.html.contains("R$ 12.50"));
    assert!(page.html.contains("<svg"));
    assert!(page.html.contains("Excluir Receita:"));

    let deleted = post(
        &router,
        "/receitas/excluir",
        &[("cliente", "Acme"), ("valor", "venda")],
    )
    .await?;
    assert_eq!(
        deleted.location.as_deref(),
        Some("/?cliente=Acme&aba=balanco&aviso=receita-excluida")
    );
    let page = get(&router, "/?cliente=Acme&aba=balanco&aviso=receita-excluida").await?;
    assert!(page.html.contains("Receita excluída."));
    assert!(page.html.contains("R$ -3.00"));
    Ok(())
}

#[tokio::test]
async fn failed_write_keeps_session_usable() -> Result<(), String> {
    let (backend, router) = test_router();
    post(&router, "/entrar", &[("nome", "Acme")]).await?;

    backend.fail_next(Operation::Write);
    let failed = post(
        &router,
        "/despesas",
        &[
            ("cliente", "Acme"),
            ("valor", "3"),
            ("data", "2024-01-01"),
            ("descricao", "aluguel"),
        ],
    )
    .await?;
    assert_eq!(failed.status, StatusCode::BAD_GATEWAY);
    assert!(failed.html.contains("notice error"));

    let retried = post(
        &router,
        "/despesas",
        &[
            ("cliente", "Acme"),
            ("valor", "3"),
            ("data", "2024-01-01"),
            ("descricao", "aluguel"),
        ],
    )
    .await?;
    assert_eq!(retried.status, StatusCode::SEE_OTHER);
    Ok(())
}

#[tokio::test]
async fn form_without_client_goes_home() -> Result<(), String> {
    let (_, router) = test_router();
    let page = post(&router, "/receitas", &[("valor", "1")]).await?;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/"));
    Ok(())
}
