use std::net::SocketAddr;

use anyhow::Context;

use crate::{AppState, config::ServerConfig, routes};

pub struct Server;

impl Server {
    pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
        let pool = db::start_db(&config.database_url)
            .await
            .context("failed to open database")?;

        let state = AppState::new(pool, config.clone());
        let router = routes::router(state);

        let addr: SocketAddr = config
            .listen_addr
            .parse()
            .context("listen address is invalid")?;
        let tcp_listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind tcp listener")?;

        tracing::info!(%addr, "board server listening");

        axum::serve(tcp_listener, router.into_make_service())
            .await
            .context("board server failure")?;

        Ok(())
    }
}
