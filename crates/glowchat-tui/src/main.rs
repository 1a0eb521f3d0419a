use std::path::PathBuf;
use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use glowchat_core::{ChatView, Config, Conversation, Provider, Surface, Turn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "glowchat")]
#[command(about = "Terminal chat with an LLM chat-completions endpoint or relay", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: <config dir>/glowchat/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Endpoint URL, overriding the config file
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// relay or openai
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model name sent with each request
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Don't flag replies that look cut off
    #[arg(long, global = true)]
    no_truncation_hint: bool,

    /// Log file (default: <cache dir>/glowchat/glowchat.log)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the reply
    Ask {
        /// Your question
        question: String,
    },
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match &cli.log_file {
        Some(path) => path.clone(),
        None => logging::default_log_path()?,
    };
    let _log_guard = logging::init(&log_path)?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };

    if let Some(Commands::Init) = cli.command {
        return init_config(&config_path);
    }

    let config = apply_overrides(Config::load_from(&config_path)?, &cli)?;
    tracing::info!(config = %config_path.display(), endpoint = ?config.endpoint_url, "starting");

    match cli.command {
        Some(Commands::Ask { question }) => ask(&config, question).await,
        Some(Commands::Init) => Ok(()),
        None => run_tui(&config).await,
    }
}

fn apply_overrides(mut config: Config, cli: &Cli) -> Result<Config> {
    if let Some(provider) = &cli.provider {
        let provider = Provider::parse(provider)?;
        config.provider = Some(provider.as_str().to_string());
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint_url = Some(endpoint.clone());
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    if cli.no_truncation_hint {
        config.truncation_hint = false;
    }
    Ok(config)
}

fn init_config(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    Config::new().save_to(path)?;
    println!("Wrote default config to {}", path.display());
    println!("Set endpoint_url to your relay, or provider to \"openai\" with an api_key.");
    Ok(())
}

async fn ask(config: &Config, question: String) -> Result<()> {
    let mut conversation = Conversation::from_config(config, ChatView::new())?;
    let mut input = question;

    let turn = conversation
        .exchange(&mut input)
        .await
        .ok_or_else(|| anyhow!("Nothing to ask: the question is empty"))?;

    if let Some(entry) = conversation.surface().last() {
        println!("{}", entry.text);
    }
    if turn == Turn::Failed {
        bail!("The chat endpoint did not answer; see the log for details");
    }
    Ok(())
}

async fn run_tui(config: &Config) -> Result<()> {
    let conversation = Conversation::from_config(config, ChatView::new())?;
    let mut app = App::new(conversation);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    let tx = events.sender();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, &tx),
            None => break,
        }
    }

    Ok(())
}
