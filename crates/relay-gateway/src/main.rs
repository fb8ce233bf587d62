//! relay-gateway: WhatsApp relay gateway main binary
//!
//! Receives WhatsApp messages over webhooks (Cloud API or Twilio),
//! generates a reply with an LLM completion provider, and relays it back
//! to the sender.
//!
//! Usage:
//!   relay-gateway            - Start the HTTP server
//!   relay-gateway --help     - Show help
//!   relay-gateway --version  - Show version

use relay_core::{Config, RelayStore};
use relay_http::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-v" => {
                println!("relay-gateway {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            _ => {}
        }
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting relay-gateway...");
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.model);

    if config.meta.can_send() {
        tracing::info!("Cloud API sending enabled");
    } else {
        tracing::info!("Cloud API sending disabled (no credentials)");
    }
    if config.meta.oauth_enabled() {
        tracing::info!("OAuth account linking enabled");
    } else {
        tracing::info!("OAuth account linking disabled (no app credentials)");
    }
    if config.twilio.is_some() {
        tracing::info!("Twilio channel enabled");
    } else {
        tracing::info!("Twilio channel disabled (no credentials)");
    }

    let store = match &config.store.db_path {
        Some(path) => {
            let store = RelayStore::new(path)
                .map_err(|e| anyhow::anyhow!("Failed to open store at {}: {}", path, e))?;
            tracing::info!("Persistence enabled at {}", path);
            Some(store)
        }
        None => {
            tracing::info!("Persistence disabled (no DB_PATH)");
            None
        }
    };

    let state = AppState::from_config(config, store)
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;

    let server = tokio::spawn(async move {
        if let Err(e) = relay_http::start_server(state).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!("relay-gateway initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    server.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_help() {
    println!("relay-gateway - WhatsApp relay gateway");
    println!();
    println!("Usage:");
    println!("  relay-gateway            Start the HTTP server");
    println!("  relay-gateway --help     Show this help message");
    println!("  relay-gateway --version  Show version");
    println!();
    println!("Environment Variables:");
    println!("  VERIFY_TOKEN               Webhook verification token (required)");
    println!("  PORT                       HTTP port (default: 10000)");
    println!("  WHATSAPP_TOKEN             Cloud API access token");
    println!("  WHATSAPP_PHONE_NUMBER_ID   Cloud API sending phone number id");
    println!("  META_APP_ID                OAuth app id");
    println!("  META_APP_SECRET            OAuth app secret");
    println!("  META_REDIRECT_URI          OAuth redirect URI");
    println!("  TWILIO_ACCOUNT_SID         Twilio account SID");
    println!("  TWILIO_AUTH_TOKEN          Twilio auth token");
    println!("  TWILIO_PHONE_NUMBER        Twilio WhatsApp number");
    println!("  LLM_PROVIDER               groq, gemini, or openai (default: groq)");
    println!("  LLM_API_KEY                Completion API key (template replies without it)");
    println!("  LLM_MODEL                  Model name (default: llama-3.1-8b-instant)");
    println!("  DB_PATH                    SQLite path (persistence off without it)");
    println!("  FRONTEND_URL               Redirect target after OAuth linking");
}
