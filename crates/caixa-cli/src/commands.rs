//! `serve`, `resolve` and `balance`.

use caixa_api::CaixaConfig;
use caixa_core::{BalanceReport, ClientName};
use caixa_store::{Resolution, Resolver};

use crate::Result;

/// Runs the HTTP server until the process is stopped.
pub async fn serve(mut config: CaixaConfig, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    caixa_api::serve(&config).await?;
    Ok(())
}

/// Resolves `name`, provisioning its spreadsheet when none exists.
pub async fn resolve_client(resolver: &Resolver, name: &str) -> Result<Resolution> {
    let name = ClientName::new(name)?;
    Ok(resolver.resolve(&name).await?)
}

/// One line describing a resolution.
pub fn resolution_line(resolution: &Resolution) -> String {
    let state = if resolution.created {
        "created"
    } else {
        "existing"
    };
    format!(
        "{}\t{}\t{state}",
        resolution.store.name(),
        resolution.store.container_id()
    )
}

/// Metrics followed by any warnings, one per line.
pub fn balance_lines(report: &BalanceReport) -> Vec<String> {
    report
        .metrics()
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .chain(report.warnings.iter().map(|warning| format!("aviso: {warning}")))
        .collect()
}

/// Validated configuration turned into a resolver.
///
/// Validation runs first so an incomplete Google setup fails before any
/// spreadsheet is created.
pub fn resolver_for(config: &CaixaConfig) -> Result<Resolver> {
    config.validate()?;
    Ok(config.build_resolver()?)
}

/// `caixa resolve <name>`
pub async fn resolve(config: &CaixaConfig, name: &str) -> Result<()> {
    let resolver = resolver_for(config)?;
    let resolution = resolve_client(&resolver, name).await?;
    println!("{}", resolution_line(&resolution));
    Ok(())
}

/// `caixa balance <name>`
pub async fn balance(config: &CaixaConfig, name: &str) -> Result<()> {
    let resolver = resolver_for(config)?;
    let resolution = resolve_client(&resolver, name).await?;
    let report = resolution.store.balance().await?;
    for line in balance_lines(&report) {
        println!("{line}");
    }
    Ok(())
}
