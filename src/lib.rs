pub mod agent;
pub mod bot;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;
pub mod telegram;
#[cfg(test)]
mod testing;

use agent::ChatAgent;
use bot::UpdateHandler;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use telegram::TelegramClient;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    args.validate()?;

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Max Tokens: {}", args.chat_max_tokens);
    info!("Temperature: {}", args.chat_temperature);
    info!("History Store Type: {}", args.history_type);
    info!("History Window: {}", args.history_window);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    match args.request_timeout_secs {
        Some(secs) => info!("Request Timeout: {}s", secs),
        None => info!("Request Timeout: none"),
    }
    info!("Serialize Chats: {}", args.serialize_chats);
    info!("-------------------------");

    let agent = ChatAgent::new(&args)?;
    let messenger = Arc::new(
        TelegramClient::new(
            args.telegram_bot_token.clone(),
            args.telegram_api_url.clone(),
            args.request_timeout_secs.map(Duration::from_secs)
        )?
    );
    let handler = UpdateHandler::new(agent, messenger);

    info!("Starting server on: {}", args.server_addr);
    let server = Server::new(args.server_addr.clone(), handler);
    server.run().await?;

    Ok(())
}
