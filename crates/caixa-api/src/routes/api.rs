//! JSON endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use caixa_core::{
    BalanceReport, ClientName, Counterparty, Record, Sheet, Table, Transaction, YearlyTarget,
};
use caixa_store::{ClientStore, TypedTable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::input::{self, AmountField};
use crate::state::AppState;
use crate::{Error, Result};

/// JSON route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/clients", post(enter_client))
        .route("/api/clients/{cliente}/balance", get(balance))
        .route(
            "/api/clients/{cliente}/{table}",
            get(read_table).post(append_record).delete(delete_rows),
        )
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Body of `POST /api/clients`.
#[derive(Debug, Deserialize)]
pub struct EnterRequest {
    /// Client name
    pub name: String,
}

/// A resolved client.
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    /// Client name
    pub name: String,
    /// Spreadsheet id
    pub container_id: String,
    /// Whether this request provisioned the spreadsheet
    pub created: bool,
}

/// `POST /api/clients`: resolves the client, provisioning on first use.
pub async fn enter_client(
    State(state): State<AppState>,
    Json(request): Json<EnterRequest>,
) -> Result<(StatusCode, Json<ClientResponse>)> {
    let name = input::client_name(&request.name)?;
    let resolution = state.enter(&name).await?;
    let status = if resolution.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ClientResponse {
            name: name.into_string(),
            container_id: resolution.store.container_id().to_string(),
            created: resolution.created,
        }),
    ))
}

async fn store_and_sheet(state: &AppState, cliente: &str, table: &str) -> Result<(ClientStore, Sheet)> {
    let sheet = Sheet::from_slug(table).ok_or_else(|| Error::UnknownTable(table.to_string()))?;
    let name = input::client_name(cliente)?;
    Ok((state.store_for(&name).await?, sheet))
}

/// `GET /api/clients/{cliente}/{table}`
pub async fn read_table(
    State(state): State<AppState>,
    Path((cliente, table)): Path<(String, String)>,
) -> Result<Json<Table>> {
    let (store, sheet) = store_and_sheet(&state, &cliente, &table).await?;
    Ok(Json(store.table(sheet).read_all().await?))
}

#[derive(Debug, Deserialize)]
struct CounterpartyBody {
    name: String,
    kind: String,
    #[serde(default)]
    contact: String,
}

#[derive(Debug, Deserialize)]
struct TargetBody {
    income_target: AmountField,
    expense_target: AmountField,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionBody {
    amount: AmountField,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    description: String,
}

fn body<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::bad_request(format!("invalid body: {e}")))
}

fn transaction(value: Value) -> Result<Transaction> {
    let body: TransactionBody = body(value)?;
    Ok(Transaction {
        amount: body.amount.parse("Valor")?,
        date: input::optional_date("Data", body.date.as_deref())?,
        description: body.description,
    })
}

async fn add<R: Record>(table: TypedTable<'_, R>, record: R) -> Result<Value> {
    table.add(&record).await?;
    let row: Map<String, Value> = record
        .cells()
        .into_iter()
        .map(|(column, cell)| (column.to_string(), Value::String(cell)))
        .collect();
    Ok(Value::Object(row))
}

/// `POST /api/clients/{cliente}/{table}`: appends one typed record.
///
/// Bodies per table:
/// - `counterparties`: `{name, kind, contact}`
/// - `targets`: `{income_target, expense_target, date}`
/// - `income`, `expenses`: `{amount, date, description}`
pub async fn append_record(
    State(state): State<AppState>,
    Path((cliente, table)): Path<(String, String)>,
    Json(value): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let (store, sheet) = store_and_sheet(&state, &cliente, &table).await?;
    let row = match sheet {
        Sheet::Counterparties => {
            let body: CounterpartyBody = body(value)?;
            let record = Counterparty {
                name: body.name,
                kind: input::counterparty_kind(&body.kind)?,
                contact: body.contact,
            };
            add(store.counterparties(), record).await?
        }
        Sheet::YearlyTargets => {
            let body: TargetBody = body(value)?;
            let record = YearlyTarget {
                income_target: body.income_target.parse("Meta Receita")?,
                expense_target: body.expense_target.parse("Meta Despesa")?,
                date: input::optional_date("Data", body.date.as_deref())?,
            };
            add(store.targets(), record).await?
        }
        Sheet::Income => add(store.income(), transaction(value)?).await?,
        Sheet::Expenses => add(store.expenses(), transaction(value)?).await?,
    };
    tracing::info!(client = %store.name(), sheet = %sheet, "record appended");
    Ok((StatusCode::CREATED, Json(row)))
}

/// Query of `DELETE /api/clients/{cliente}/{table}`.
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    /// Key column value; every matching row goes
    pub value: String,
}

/// `DELETE /api/clients/{cliente}/{table}?value=`
pub async fn delete_rows(
    State(state): State<AppState>,
    Path((cliente, table)): Path<(String, String)>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>> {
    let (store, sheet) = store_and_sheet(&state, &cliente, &table).await?;
    let removed = store.table(sheet).delete_by_key(&params.value).await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

/// One headline number.
#[derive(Debug, Serialize)]
pub struct Metric {
    /// Label as shown on the dashboard
    pub label: &'static str,
    /// Formatted currency
    pub value: String,
}

/// Body of `GET /api/clients/{cliente}/balance`.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Raw report
    #[serde(flatten)]
    pub report: BalanceReport,
    /// Formatted metrics
    pub metrics: Vec<Metric>,
}

/// `GET /api/clients/{cliente}/balance`
pub async fn balance(
    State(state): State<AppState>,
    Path(cliente): Path<String>,
) -> Result<Json<BalanceResponse>> {
    let name: ClientName = input::client_name(&cliente)?;
    let report = state.store_for(&name).await?.balance().await?;
    let metrics = report
        .metrics()
        .into_iter()
        .map(|(label, value)| Metric { label, value })
        .collect();
    Ok(Json(BalanceResponse { report, metrics }))
}
