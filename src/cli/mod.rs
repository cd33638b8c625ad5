//! Command-line interface parsing and dispatch.

use std::error::Error;

use clap::{Parser, Subcommand};

use crate::auth::AuthManager;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "uturu")]
#[command(about = "A terminal chat interface for the Gregory University FAQ")]
#[command(version)]
#[command(
    long_about = "Uturu is a full-screen terminal chat interface for the official Gregory \
University FAQ. Questions are forwarded to the Gemini API together with the FAQ as grounding \
context, and replies stream back into the transcript.\n\n\
Authentication:\n\
  Use 'uturu auth' to store your Gemini API key securely in the system keyring.\n\
  Get a free key at https://aistudio.google.com/app/apikey\n\n\
Environment Variables (fallback if no key is stored):\n\
  GEMINI_API_KEY    Your Gemini API key\n\
  GEMINI_BASE_URL   Custom API base URL (optional)\n\n\
Controls:\n\
  Type              Enter your question in the input field\n\
  Enter             Send the question\n\
  Up/Down           Scroll through the transcript\n\
  Ctrl+C            Quit\n\n\
Commands:\n\
  /help             Show extended help\n\
  /log <filename>   Enable transcript logging to a file\n\
  /log              Toggle logging pause/resume"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use: gemini-2.5-flash (default) or gemini-2.5-pro
    #[arg(short, long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// API key override; takes precedence over the keyring and environment
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Enable transcript logging to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store the Gemini API key in the system keyring
    Auth,
    /// Remove the stored Gemini API key
    Deauth,
    /// Start the chat interface (default)
    Chat,
}

fn init_tracing() {
    // Diagnostics go to stderr only when explicitly requested; unsolicited
    // output would tear up the alternate-screen interface.
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Auth) => {
            let auth_manager = AuthManager::new();
            if let Err(e) = auth_manager.interactive_auth() {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Deauth) => {
            let auth_manager = AuthManager::new();
            if let Err(e) = auth_manager.interactive_deauth() {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Chat) | None => run_chat(args.model, args.api_key, args.log).await,
    }
}
