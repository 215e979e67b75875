//! CLI binary for chatting with the configured providers.

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use polychat_llm::{Conversation, CostLedger, Gateway, GatewayConfig};
use polychat_types::ProviderId;

#[derive(Parser)]
#[command(name = "polychat", version, about = "Chat with several LLM providers and track what it costs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List providers with their models and prices
    Providers,

    /// Send a single prompt and print the reply
    Ask {
        /// Provider to use (llama, chatgpt, claude, gemini)
        #[arg(short, long, default_value = "llama")]
        provider: ProviderId,

        /// The prompt text
        prompt: String,
    },

    /// Start an interactive chat session
    Chat {
        /// Provider selected at start (llama, chatgpt, claude, gemini)
        #[arg(short, long, default_value = "llama")]
        provider: ProviderId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Loaded before tracing so a RUST_LOG set in .env applies. A missing
    // file is fine; the environment may already be set.
    let dotenv = dotenvy::dotenv();

    // Setup tracing
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let config = GatewayConfig::from_env()?;
    let gateway = Gateway::from_config(&config)?;

    match cli.command {
        Commands::Providers => cmd_providers(&gateway),
        Commands::Ask { provider, prompt } => cmd_ask(&gateway, provider, prompt).await?,
        Commands::Chat { provider } => cmd_chat(&gateway, provider).await?,
    }

    Ok(())
}

/// `RUST_LOG` wins when it parses; otherwise `debug` or `info` per `--verbose`.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

fn cmd_providers(gateway: &Gateway) {
    for desc in gateway.descriptors() {
        println!(
            "{:<8} {:<14} {:<28} ${:.2}/M tokens  {}",
            desc.id,
            desc.display_name,
            gateway.model(desc.id).unwrap_or("-"),
            gateway.price_per_million(desc.id).unwrap_or(0.0),
            desc.accent_color,
        );
    }
}

async fn cmd_ask(gateway: &Gateway, provider: ProviderId, prompt: String) -> anyhow::Result<()> {
    let mut convo = Conversation::new(provider);
    let result = convo.submit(gateway, prompt).await?;
    println!("{}", result.reply_text);
    let approx = if result.tokens.is_estimate() { "~" } else { "" };
    println!("\n[{}] cost: {}${:.6}", result.provider, approx, result.cost);
    Ok(())
}

async fn cmd_chat(gateway: &Gateway, provider: ProviderId) -> anyhow::Result<()> {
    let mut convo = Conversation::new(provider);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("Chatting with {}. Commands: /use <provider>, /costs, /quit", provider.descriptor().display_name);

    loop {
        stdout
            .write_all(format!("{}> ", convo.selected().as_str().to_lowercase()).as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Costs => print_ledger(convo.ledger()),
            Input::Use(Ok(id)) => {
                convo.select(id);
                println!("Now using {}", id.descriptor().display_name);
            }
            Input::Use(Err(e)) => println!("{e}"),
            Input::Unknown(cmd) => println!("Unknown command: {cmd}"),
            Input::Prompt(text) => match convo.submit(gateway, text).await {
                Ok(result) => {
                    println!("{}", result.reply_text);
                    println!(
                        "  [{} +${:.6}, session ${:.6}]",
                        result.provider,
                        result.cost,
                        convo.ledger().get(result.provider)
                    );
                }
                Err(e) => println!("Error: {e}"),
            },
        }
    }

    print_ledger(convo.ledger());
    Ok(())
}

fn print_ledger(ledger: &CostLedger) {
    for (id, cost) in ledger.iter() {
        println!("  {:<8} ${:.6}", id, cost);
    }
    println!("  {:<8} ${:.6}", "TOTAL", ledger.total());
}

// ---------------------------------------------------------------------------
// REPL input
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Input {
    Empty,
    Quit,
    Costs,
    Use(polychat_types::Result<ProviderId>),
    Unknown(String),
    Prompt(String),
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Prompt(trimmed.to_string());
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));
    match name {
        "quit" | "exit" => Input::Quit,
        "costs" => Input::Costs,
        "use" => Input::Use(arg.parse()),
        _ => Input::Unknown(format!("/{name}")),
    }
}
