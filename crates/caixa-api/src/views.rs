//! Server-rendered pages.
//!
//! Every function here is pure: it takes already-loaded data and returns
//! markup. User-supplied text always goes through [`escape`].

use std::fmt::Write as _;

use caixa_core::coerce::format_amount;
use caixa_core::sheet::columns::{DATA, DESCRICAO};
use caixa_core::{BalanceReport, ClientName, Table, TimeSeries};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;

/// Sidebar entries of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    /// Clientes e Fornecedores
    #[default]
    Counterparties,
    /// Metas do Ano
    Targets,
    /// Balanço Geral
    Balance,
}

impl Tab {
    /// Every tab in menu order.
    pub const ALL: [Tab; 3] = [Tab::Counterparties, Tab::Targets, Tab::Balance];

    /// Value of the `aba` query parameter.
    pub fn slug(self) -> &'static str {
        match self {
            Tab::Counterparties => "clientes",
            Tab::Targets => "metas",
            Tab::Balance => "balanco",
        }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Tab::Counterparties => "Clientes e Fornecedores",
            Tab::Targets => "Metas do Ano",
            Tab::Balance => "Balanço Geral",
        }
    }

    /// Inverse of [`Tab::slug`]; unknown values fall back to the first tab.
    pub fn from_slug(slug: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|tab| Some(tab.slug()) == slug)
            .unwrap_or_default()
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Action succeeded
    Success,
    /// Input or data problem
    Warning,
    /// Backend failure
    Error,
}

/// A message shown above the page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub kind: NoticeKind,
    /// Text, unescaped
    pub text: String,
}

impl Notice {
    /// Success notice.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    /// Warning notice.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    /// Error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    fn render(&self) -> String {
        let class = match self.kind {
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        };
        format!(
            r#"<div class="notice {class}" role="status">{}</div>"#,
            escape(&self.text)
        )
    }
}

/// Escapes text for use in HTML content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;color:#262730}\
main{padding:2rem 3rem;flex:1}\
.layout{display:flex;min-height:100vh}\
nav{width:16rem;background:#f0f2f6;padding:2rem 1rem}\
nav a{display:block;padding:.4rem .6rem;color:#262730;text-decoration:none;border-radius:.3rem}\
nav a.active{background:#ff4b4b;color:#fff}\
form{margin:1rem 0}\
label{display:block;margin:.6rem 0 .2rem}\
input,select{padding:.4rem;min-width:16rem}\
button{margin-top:.8rem;padding:.4rem 1rem}\
table{border-collapse:collapse;margin:1rem 0}\
td,th{border:1px solid #ddd;padding:.3rem .6rem}\
.columns{display:flex;gap:3rem}\
.metrics{display:flex;gap:3rem;margin:1.5rem 0}\
.metric .value{font-size:1.8rem}\
.notice{padding:.8rem 1rem;border-radius:.3rem;margin:.8rem 0}\
.success{background:#dff5e3}.warning{background:#fff6d6}.error{background:#ffe0e0}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\"><head><meta charset=\"utf-8\">\
         <title>{}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        escape(title)
    )
}

fn notices(list: &[Notice]) -> String {
    list.iter().map(Notice::render).collect()
}

fn hidden_client(client: &ClientName) -> String {
    format!(
        r#"<input type="hidden" name="cliente" value="{}">"#,
        escape(client.as_str())
    )
}

/// The sign-in screen.
pub fn cadastro(notice: Option<&Notice>) -> String {
    let body = format!(
        r#"<main><h1>Dashboard Financeiro - Cadastro</h1>{}
<form method="post" action="/entrar">
<label for="nome">Digite o nome da sua empresa ou seu nome completo</label>
<input id="nome" name="nome" type="text">
<button type="submit">Entrar</button>
</form></main>"#,
        notice.map(Notice::render).unwrap_or_default()
    );
    page("Dashboard Financeiro - Cadastro", &body)
}

/// Dashboard frame: sidebar menu plus the tab's content.
pub fn dashboard(client: &ClientName, tab: Tab, notice_list: &[Notice], content: &str) -> String {
    let mut menu = String::new();
    for entry in Tab::ALL {
        let class = if entry == tab { r#" class="active""# } else { "" };
        let _ = write!(
            menu,
            r#"<a{class} href="{}">{}</a>"#,
            escape(&tab_href(client, entry, None)),
            entry.label()
        );
    }
    let body = format!(
        r#"<div class="layout"><nav><h2>Menu</h2><p>Ir para:</p>{menu}<p><small>{}</small></p></nav>
<main>{}{content}</main></div>"#,
        escape(client.as_str()),
        notices(notice_list)
    );
    page(&format!("{} - {}", tab.label(), client), &body)
}

/// Relative URL of a dashboard tab, optionally carrying a notice code.
pub fn tab_href(client: &ClientName, tab: Tab, notice: Option<&str>) -> String {
    let mut params = vec![("cliente", client.as_str()), ("aba", tab.slug())];
    if let Some(code) = notice {
        params.push(("aviso", code));
    }
    // Encoding string pairs cannot fail.
    let query = serde_urlencoded::to_string(&params).unwrap_or_default();
    format!("/?{query}")
}

/// Read-only rendering of a worksheet.
pub fn table_view(table: &Table) -> String {
    let mut html = String::from("<table><thead><tr>");
    for column in table.columns() {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr></thead><tbody>");
    for row in table.rows() {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape(cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn delete_form(client: &ClientName, action: &str, label: &str, values: &[String], button: &str) -> String {
    let options: String = values
        .iter()
        .map(|value| format!(r#"<option value="{0}">{0}</option>"#, escape(value)))
        .collect();
    format!(
        r#"<form method="post" action="{action}">{}
<label>{label}</label><select name="valor">{options}</select>
<button type="submit">{button}</button></form>"#,
        hidden_client(client)
    )
}

fn amount_input(name: &str, id: &str, label: &str) -> String {
    format!(
        r#"<label for="{id}">{label}</label>
<input id="{id}" name="{name}" type="number" min="0" step="0.01" value="0.00">"#
    )
}

fn date_input(name: &str, id: &str, label: &str, today: NaiveDate) -> String {
    format!(
        r#"<label for="{id}">{label}</label>
<input id="{id}" name="{name}" type="date" value="{}">"#,
        today.format("%Y-%m-%d")
    )
}

/// `Clientes e Fornecedores` tab.
pub fn counterparties_tab(client: &ClientName, table: &Table, keys: &[String]) -> String {
    let mut html = format!(
        r#"<h2>Cadastro de Clientes e Fornecedores</h2>
<form method="post" action="/clientes">{}
<label for="nome">Nome</label><input id="nome" name="nome" type="text">
<label for="tipo">Tipo</label><select id="tipo" name="tipo"><option>Cliente</option><option>Fornecedor</option></select>
<label for="contato">Contato</label><input id="contato" name="contato" type="text">
<button type="submit">Salvar Cadastro</button></form>"#,
        hidden_client(client)
    );
    if !table.is_empty() {
        html.push_str(&table_view(table));
        html.push_str(&delete_form(
            client,
            "/clientes/excluir",
            "Selecione um cadastro para excluir:",
            keys,
            "Excluir Cadastro",
        ));
    }
    html
}

/// `Metas do Ano` tab.
pub fn targets_tab(client: &ClientName, table: &Table, keys: &[String], today: NaiveDate) -> String {
    let mut html = format!(
        r#"<h2>Metas do Ano</h2><form method="post" action="/metas">{}{}{}{}
<button type="submit">Salvar Metas</button></form>"#,
        hidden_client(client),
        amount_input("meta_receita", "meta_receita", "Meta de Receita"),
        amount_input("meta_despesa", "meta_despesa", "Meta de Despesa"),
        date_input("data", "data", "Data da Meta", today),
    );
    if !table.is_empty() {
        html.push_str(&table_view(table));
        html.push_str(&delete_form(
            client,
            "/metas/excluir",
            "Selecione a data da meta para excluir:",
            keys,
            "Excluir Meta",
        ));
    }
    html
}

/// Data behind the `Balanço Geral` tab.
#[derive(Debug)]
pub struct BalanceTab<'a> {
    /// Receitas worksheet
    pub income: &'a Table,
    /// Despesas worksheet
    pub expenses: &'a Table,
    /// Totals and series
    pub report: &'a BalanceReport,
    /// Default for the date inputs
    pub today: NaiveDate,
}

/// Warning shown instead of the chart when a `Data` column is missing.
pub const MISSING_DATE_WARNING: &str =
    "Coluna 'Data' não encontrada nas planilhas de receitas ou despesas.";

/// `Balanço Geral` tab.
pub fn balance_tab(client: &ClientName, data: &BalanceTab<'_>) -> String {
    let mut html = String::from(r#"<div class="columns">"#);
    for (key, action, button) in [
        ("Receita", "/receitas", "Salvar Receita"),
        ("Despesa", "/despesas", "Salvar Despesa"),
    ] {
        let suffix = key.to_lowercase();
        let _ = write!(
            html,
            r#"<section><h3>{key}</h3><form method="post" action="{action}">{}{}{}
<label for="descricao_{suffix}">Descrição {key}</label><input id="descricao_{suffix}" name="descricao" type="text">
<button type="submit">{button}</button></form></section>"#,
            hidden_client(client),
            amount_input("valor", &format!("valor_{suffix}"), &format!("Valor {key}")),
            date_input("data", &format!("data_{suffix}"), &format!("Data {key}"), data.today),
        );
    }
    html.push_str("</div><div class=\"metrics\">");
    for (label, value) in data.report.metrics() {
        let _ = write!(
            html,
            r#"<div class="metric"><div>{label}</div><div class="value">{value}</div></div>"#
        );
    }
    html.push_str("</div><h3>Evolução Financeira</h3>");
    match &data.report.series {
        Some(series) => html.push_str(&chart(series)),
        None => html.push_str(&Notice::warning(MISSING_DATE_WARNING).render()),
    }
    for warning in &data.report.warnings {
        if !warning.is_missing_column(DATA) {
            html.push_str(&Notice::warning(warning.to_string()).render());
        }
    }

    for (table, action, label, button) in [
        (data.income, "/receitas/excluir", "Excluir Receita:", "Excluir Receita"),
        (data.expenses, "/despesas/excluir", "Excluir Despesa:", "Excluir Despesa"),
    ] {
        if !table.is_empty() && table.has_column(DESCRICAO) {
            html.push_str(&delete_form(client, action, label, &table.distinct(DESCRICAO), button));
        }
    }
    html
}

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 60.0;
const MARGIN_TOP: f64 = 30.0;

/// Overlaid income/expense bar chart by date, as inline SVG.
pub fn chart(series: &TimeSeries) -> String {
    let dates = series.dates();
    let plot_width = CHART_WIDTH - MARGIN_LEFT - 10.0;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = CHART_HEIGHT - MARGIN_BOTTOM;
    let max = series.max_total().to_f64().unwrap_or(0.0).max(f64::EPSILON);
    let slot = plot_width / dates.len().max(1) as f64;
    let bar_width = slot * 0.6;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CHART_WIDTH}" height="{CHART_HEIGHT}" role="img" aria-label="Evolução Financeira">"#
    );
    let _ = write!(
        svg,
        r##"<line x1="{MARGIN_LEFT}" y1="{baseline}" x2="{}" y2="{baseline}" stroke="#333"/>"##,
        CHART_WIDTH - 10.0
    );

    for (index, date) in dates.iter().enumerate() {
        let x = MARGIN_LEFT + slot * index as f64 + (slot - bar_width) / 2.0;
        for (buckets, color, opacity) in [
            (&series.income, "green", 1.0),
            (&series.expense, "red", 0.7),
        ] {
            let Some(bucket) = buckets.iter().find(|b| b.date == *date) else {
                continue;
            };
            let value = bucket.total.to_f64().unwrap_or(0.0).max(0.0);
            let height = value / max * plot_height;
            let _ = write!(
                svg,
                r#"<rect x="{x:.1}" y="{:.1}" width="{bar_width:.1}" height="{height:.1}" fill="{color}" fill-opacity="{opacity}"><title>{}</title></rect>"#,
                baseline - height,
                format_amount(bucket.total)
            );
        }
        let label = date.map_or_else(|| "sem data".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end" transform="rotate(-45 {:.1} {:.1})">{label}</text>"#,
            x + bar_width / 2.0,
            baseline + 14.0,
            x + bar_width / 2.0,
            baseline + 14.0,
        );
    }

    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{}" font-size="12" text-anchor="middle">Data</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        CHART_HEIGHT - 4.0
    );
    let _ = write!(
        svg,
        r#"<text x="14" y="{:.1}" font-size="12" text-anchor="middle" transform="rotate(-90 14 {:.1})">Valor (R$)</text>"#,
        MARGIN_TOP + plot_height / 2.0,
        MARGIN_TOP + plot_height / 2.0,
    );
    let _ = write!(
        svg,
        r#"<rect x="{0}" y="8" width="10" height="10" fill="green"/><text x="{1}" y="17" font-size="11">Receitas</text><rect x="{2}" y="8" width="10" height="10" fill="red" fill-opacity="0.7"/><text x="{3}" y="17" font-size="11">Despesas</text>"#,
        MARGIN_LEFT,
        MARGIN_LEFT + 14.0,
        MARGIN_LEFT + 80.0,
        MARGIN_LEFT + 94.0,
    );
    svg.push_str("</svg>");
    svg
}
