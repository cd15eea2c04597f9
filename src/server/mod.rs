pub mod api;

use crate::bot::UpdateHandler;
use std::error::Error;
use std::net::SocketAddr;

pub struct Server {
    addr: String,
    handler: UpdateHandler,
}

impl Server {
    pub fn new(addr: String, handler: UpdateHandler) -> Self {
        Self { addr, handler }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid server address '{}': {}", self.addr, e))?;
        api::start_http_server(addr, api::AppState { handler: self.handler.clone() }).await
    }
}
