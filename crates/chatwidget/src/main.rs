//! Terminal chat client driving a single conversation session.

use anyhow::Context;
use chatwidget::config::{ChatWidgetConfig, LayeredConfigOptions};
use chatwidget::core::{SessionManager, format_timestamp};
use chatwidget::protocol::Message;
use clap::Parser;
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Supported slash commands at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Clear,
    Quit,
    Message(&'a str),
    Empty,
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Input::Empty,
            "/clear" => Input::Clear,
            "/quit" | "/exit" => Input::Quit,
            _ => Input::Message(line.trim_end_matches(['\r', '\n'])),
        }
    }
}

/// Command-line options for the chat client.
#[derive(Parser)]
#[command(name = "chatwidget", version)]
struct Cli {
    /// Optional chatwidget.json5 applied on top of user and cwd layers
    #[arg(long)]
    config: Option<PathBuf>,
    /// User id whose history is loaded and saved
    #[arg(long)]
    user: Option<String>,
    /// Model name override
    #[arg(long)]
    model: Option<String>,
}

/// Entry point for the chat client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chatwidget::init_logging();

    let cli = Cli::parse();
    info!(
        "starting chat client (config_set={}, user_set={}, model_set={})",
        cli.config.is_some(),
        cli.user.is_some(),
        cli.model.is_some()
    );

    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered = ChatWidgetConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let mut config = layered.config;
    if let Some(model) = cli.model {
        config.client.model = model;
    }
    config.validate().context("invalid config")?;

    let user_id = cli
        .user
        .or_else(|| config.session.user_id.clone())
        .unwrap_or_default();
    let manager =
        SessionManager::from_config(&config).context("failed to build chat session")?;
    manager.initialize(&user_id, config.session.welcome_message.as_deref());
    for message in manager.messages() {
        print_message(&message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match Input::parse(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Clear => {
                manager.clear_messages();
                for message in manager.messages() {
                    print_message(&message);
                }
            }
            Input::Message(content) => {
                let seen = manager.messages().len();
                tokio::select! {
                    _ = manager.send_message(content) => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("interrupted while waiting for a reply");
                        break;
                    }
                }
                for message in manager.messages().iter().skip(seen + 1) {
                    print_message(message);
                }
                if let Some(error) = manager.error() {
                    eprintln!("error: {error}");
                    manager.clear_error();
                }
            }
        }
    }

    manager.dispose();
    info!("chat client stopped");
    Ok(())
}

fn prompt() -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}

fn print_message(message: &Message) {
    println!(
        "[{}] {}: {}",
        format_timestamp(message),
        message.role.as_str(),
        message.content
    );
}
