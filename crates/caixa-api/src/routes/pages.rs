//! HTML pages and their form actions.
//!
//! Every action redirects back to its tab with an `aviso` code on success
//! (post/redirect/get). Failures re-render the tab with the message instead.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use caixa_core::{BalanceReport, ClientName, Counterparty, Sheet, Transaction, YearlyTarget};
use serde::Deserialize;

use super::input;
use crate::state::AppState;
use crate::views::{self, BalanceTab, Notice, Tab};
use crate::{Error, Result};

/// HTML route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/entrar", post(enter))
        .route("/clientes", post(save_counterparty))
        .route("/clientes/excluir", post(delete_counterparty))
        .route("/metas", post(save_target))
        .route("/metas/excluir", post(delete_target))
        .route("/receitas", post(save_income))
        .route("/receitas/excluir", post(delete_income))
        .route("/despesas", post(save_expense))
        .route("/despesas/excluir", post(delete_expense))
}

/// Outcome of a successful form action, carried in the `aviso` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    /// Counterparty saved
    CounterpartySaved,
    /// Counterparty deleted
    CounterpartyDeleted,
    /// Target saved
    TargetSaved,
    /// Target deleted
    TargetDeleted,
    /// Income saved
    IncomeSaved,
    /// Expense saved
    ExpenseSaved,
    /// Income deleted
    IncomeDeleted,
    /// Expense deleted
    ExpenseDeleted,
}

impl Flash {
    const ALL: [Flash; 8] = [
        Flash::CounterpartySaved,
        Flash::CounterpartyDeleted,
        Flash::TargetSaved,
        Flash::TargetDeleted,
        Flash::IncomeSaved,
        Flash::ExpenseSaved,
        Flash::IncomeDeleted,
        Flash::ExpenseDeleted,
    ];

    /// Query parameter value.
    pub fn code(self) -> &'static str {
        match self {
            Flash::CounterpartySaved => "cadastro-salvo",
            Flash::CounterpartyDeleted => "cadastro-excluido",
            Flash::TargetSaved => "metas-salvas",
            Flash::TargetDeleted => "meta-excluida",
            Flash::IncomeSaved => "receita-salva",
            Flash::ExpenseSaved => "despesa-salva",
            Flash::IncomeDeleted => "receita-excluida",
            Flash::ExpenseDeleted => "despesa-excluida",
        }
    }

    /// Text shown to the user.
    pub fn text(self) -> &'static str {
        match self {
            Flash::CounterpartySaved => "Cadastro salvo com sucesso!",
            Flash::CounterpartyDeleted => "Cadastro excluído!",
            Flash::TargetSaved => "Metas salvas com sucesso!",
            Flash::TargetDeleted => "Meta excluída!",
            Flash::IncomeSaved => "Receita salva com sucesso!",
            Flash::ExpenseSaved => "Despesa salva com sucesso!",
            Flash::IncomeDeleted => "Receita excluída.",
            Flash::ExpenseDeleted => "Despesa excluída.",
        }
    }

    /// Inverse of [`Flash::code`].
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flash| flash.code() == code)
    }
}

/// Query of `GET /`.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// Client name
    pub cliente: Option<String>,
    /// Tab slug
    pub aba: Option<String>,
    /// Flash code
    pub aviso: Option<String>,
}

/// `GET /`: the cadastro screen, or a dashboard tab for `cliente`.
pub async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Response {
    let Some(name) = query
        .cliente
        .as_deref()
        .and_then(|text| input::client_name(text).ok())
    else {
        return Html(views::cadastro(None)).into_response();
    };
    let tab = Tab::from_slug(query.aba.as_deref());
    let notices: Vec<Notice> = query
        .aviso
        .as_deref()
        .and_then(Flash::from_code)
        .map(|flash| Notice::success(flash.text()))
        .into_iter()
        .collect();
    render(&state, &name, tab, notices, StatusCode::OK).await
}

async fn tab_content(state: &AppState, name: &ClientName, tab: Tab) -> Result<String> {
    let store = state.store_for(name).await?;
    let today = chrono::Local::now().date_naive();
    Ok(match tab {
        Tab::Counterparties => {
            let table = store.table(Sheet::Counterparties).read_all().await?;
            let keys = table.distinct(Sheet::Counterparties.key_column());
            views::counterparties_tab(name, &table, &keys)
        }
        Tab::Targets => {
            let table = store.table(Sheet::YearlyTargets).read_all().await?;
            let keys = table.distinct(Sheet::YearlyTargets.key_column());
            views::targets_tab(name, &table, &keys, today)
        }
        Tab::Balance => {
            let (income_table, expense_table) =
                (store.table(Sheet::Income), store.table(Sheet::Expenses));
            let (income, expenses) =
                tokio::try_join!(income_table.read_all(), expense_table.read_all())?;
            let report = BalanceReport::compute(&income, &expenses);
            for warning in &report.warnings {
                tracing::debug!(client = %name, %warning, "balance degraded");
            }
            views::balance_tab(
                name,
                &BalanceTab {
                    income: &income,
                    expenses: &expenses,
                    report: &report,
                    today,
                },
            )
        }
    })
}

async fn render(
    state: &AppState,
    name: &ClientName,
    tab: Tab,
    mut notices: Vec<Notice>,
    status: StatusCode,
) -> Response {
    let content = match tab_content(state, name, tab).await {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(client = %name, error = %err, "failed to load tab");
            notices.push(Notice::error(err.notice()));
            String::new()
        }
    };
    (status, Html(views::dashboard(name, tab, &notices, &content))).into_response()
}

/// Redirects on success; re-renders the tab with the failure otherwise.
async fn finish(
    state: &AppState,
    name: &ClientName,
    tab: Tab,
    flash: Flash,
    outcome: Result<()>,
) -> Response {
    match outcome {
        Ok(()) => Redirect::to(&views::tab_href(name, tab, Some(flash.code()))).into_response(),
        Err(err) => {
            let (status, _) = err.status_and_code();
            let notice = if status == StatusCode::BAD_REQUEST {
                Notice::warning(err.notice())
            } else {
                tracing::warn!(client = %name, error = %err, "form action failed");
                Notice::error(err.notice())
            };
            render(state, name, tab, vec![notice], status).await
        }
    }
}

fn home() -> Response {
    Redirect::to("/").into_response()
}

/// Form of `POST /entrar`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnterForm {
    /// Client name as typed
    pub nome: String,
}

/// `POST /entrar`: resolves the client and opens its dashboard.
pub async fn enter(State(state): State<AppState>, Form(form): Form<EnterForm>) -> Response {
    let name = match input::client_name(&form.nome) {
        Ok(name) => name,
        Err(err) => return Html(views::cadastro(Some(&Notice::warning(err.notice())))).into_response(),
    };
    match state.enter(&name).await {
        Ok(resolution) => {
            tracing::info!(
                client = %name,
                container_id = %resolution.store.container_id(),
                created = resolution.created,
                "client entered"
            );
            let query = serde_urlencoded::to_string([("cliente", name.as_str())]).unwrap_or_default();
            Redirect::to(&format!("/?{query}")).into_response()
        }
        Err(err) => {
            let (status, _) = err.status_and_code();
            let page = views::cadastro(Some(&Notice::error(err.notice())));
            (status, Html(page)).into_response()
        }
    }
}

/// Form of `POST /clientes`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CounterpartyForm {
    /// Client name
    pub cliente: String,
    /// Nome
    pub nome: String,
    /// Tipo
    pub tipo: String,
    /// Contato
    pub contato: String,
}

/// Form of `POST /metas`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TargetForm {
    /// Client name
    pub cliente: String,
    /// Meta de Receita
    pub meta_receita: String,
    /// Meta de Despesa
    pub meta_despesa: String,
    /// Data da Meta
    pub data: String,
}

/// Form of `POST /receitas` and `POST /despesas`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransactionForm {
    /// Client name
    pub cliente: String,
    /// Valor
    pub valor: String,
    /// Data
    pub data: String,
    /// Descrição
    pub descricao: String,
}

/// Form of every `/excluir` action.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteForm {
    /// Client name
    pub cliente: String,
    /// Key value whose rows are removed
    pub valor: String,
}

/// `POST /clientes`
pub async fn save_counterparty(
    State(state): State<AppState>,
    Form(form): Form<CounterpartyForm>,
) -> Response {
    let Ok(name) = input::client_name(&form.cliente) else {
        return home();
    };
    let outcome = async {
        let record = Counterparty {
            name: form.nome.trim().to_string(),
            kind: input::counterparty_kind(&form.tipo)?,
            contact: form.contato.trim().to_string(),
        };
        state.store_for(&name).await?.counterparties().add(&record).await?;
        Ok::<(), Error>(())
    }
    .await;
    finish(&state, &name, Tab::Counterparties, Flash::CounterpartySaved, outcome).await
}

/// `POST /metas`
pub async fn save_target(State(state): State<AppState>, Form(form): Form<TargetForm>) -> Response {
    let Ok(name) = input::client_name(&form.cliente) else {
        return home();
    };
    let outcome = async {
        let record = YearlyTarget {
            income_target: input::amount("Meta de Receita", &form.meta_receita)?,
            expense_target: input::amount("Meta de Despesa", &form.meta_despesa)?,
            date: Some(input::date("Data da Meta", &form.data)?),
        };
        state.store_for(&name).await?.targets().add(&record).await?;
        Ok::<(), Error>(())
    }
    .await;
    finish(&state, &name, Tab::Targets, Flash::TargetSaved, outcome).await
}

fn transaction(form: &TransactionForm, kind: &str) -> Result<Transaction> {
    Ok(Transaction {
        amount: input::amount(&format!("Valor {kind}"), &form.valor)?,
        date: Some(input::date(&format!("Data {kind}"), &form.data)?),
        description: form.descricao.trim().to_string(),
    })
}

/// `POST /receitas`
pub async fn save_income(
    State(state): State<AppState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let Ok(name) = input::client_name(&form.cliente) else {
        return home();
    };
    let outcome = async {
        let record = transaction(&form, "Receita")?;
        state.store_for(&name).await?.income().add(&record).await?;
        Ok::<(), Error>(())
    }
    .await;
    finish(&state, &name, Tab::Balance, Flash::IncomeSaved, outcome).await
}

/// `POST /despesas`
pub async fn save_expense(
    State(state): State<AppState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let Ok(name) = input::client_name(&form.cliente) else {
        return home();
    };
    let outcome = async {
        let record = transaction(&form, "Despesa")?;
        state.store_for(&name).await?.expenses().add(&record).await?;
        Ok::<(), Error>(())
    }
    .await;
    finish(&state, &name, Tab::Balance, Flash::ExpenseSaved, outcome).await
}

async fn delete(state: &AppState, form: &DeleteForm, sheet: Sheet, tab: Tab, flash: Flash) -> Response {
    let Ok(name) = input::client_name(&form.cliente) else {
        return home();
    };
    let outcome = async {
        let store = state.store_for(&name).await?;
        let removed = store.table(sheet).delete_by_key(&form.valor).await?;
        tracing::info!(client = %name, sheet = %sheet, removed, "rows deleted");
        Ok::<(), Error>(())
    }
    .await;
    finish(state, &name, tab, flash, outcome).await
}

/// `POST /clientes/excluir`
pub async fn delete_counterparty(
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> Response {
    delete(&state, &form, Sheet::Counterparties, Tab::Counterparties, Flash::CounterpartyDeleted).await
}

/// `POST /metas/excluir`
pub async fn delete_target(State(state): State<AppState>, Form(form): Form<DeleteForm>) -> Response {
    delete(&state, &form, Sheet::YearlyTargets, Tab::Targets, Flash::TargetDeleted).await
}

/// `POST /receitas/excluir`
pub async fn delete_income(State(state): State<AppState>, Form(form): Form<DeleteForm>) -> Response {
    delete(&state, &form, Sheet::Income, Tab::Balance, Flash::IncomeDeleted).await
}

/// `POST /despesas/excluir`
pub async fn delete_expense(
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> Response {
    delete(&state, &form, Sheet::Expenses, Tab::Balance, Flash::ExpenseDeleted).await
}
