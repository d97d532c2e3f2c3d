//! Listener and serve loop.

use tokio::net::TcpListener;

use crate::config::CaixaConfig;
use crate::router::router;
use crate::state::AppState;
use crate::{Error, Result};

/// Validates `config`, binds the listener and serves until the process ends.
pub async fn serve(config: &CaixaConfig) -> Result<()> {
    config.validate()?;
    let addr = config.bind_addr()?;
    let state = AppState::new(config.build_resolver()?);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Server { addr, source })?;
    tracing::info!(
        %addr,
        backend = ?config.store.backend,
        folder = %state.resolver.folder(),
        "caixa listening"
    );

    axum::serve(listener, router(state))
        .await
        .map_err(|source| Error::Server { addr, source })
}
