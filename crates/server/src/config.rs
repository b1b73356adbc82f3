use std::env;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let database_url = env::var("BOARD_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "sqlite:mero_board.db".to_string());

        let listen_addr =
            env::var("BOARD_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        Self {
            database_url,
            listen_addr,
        }
    }
}
