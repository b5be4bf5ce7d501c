use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use parley_core::config::{ConfigLoader, ParleyConfig};
use parley_core::tools::ToolFactory;
use parley_core::{Assistant, Conversation};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[clap(name = "Parley", author, version = "0.1.0", about = "Parley assistant engine")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, default_value = "parley.yaml", help = "Path to the YAML configuration file")]
    config: PathBuf,

    #[clap(long, short, help = "Log level; defaults to logging.level from the config file")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the next assistant reply for a stored conversation
    Reply {
        /// Conversation JSON file
        conversation: PathBuf,

        #[clap(long, help = "Append the reply to the conversation file")]
        save: bool,
    },
    /// Generate a title for a stored conversation
    Title {
        /// Conversation JSON file
        conversation: PathBuf,
    },
    /// Ask a single question
    Ask {
        text: String,
    },
    /// Print the descriptors of the enabled tools as JSON
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::from_file_or_default(&cli.config)
        .await
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_str())
        .parse()
        .unwrap_or(LevelFilter::Info);
    // Logs go to stderr so replies can be piped.
    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .init();

    match cli.command {
        Commands::Reply { conversation, save } => run_reply(&config, &conversation, save).await,
        Commands::Title { conversation } => run_title(&config, &conversation).await,
        Commands::Ask { text } => {
            let mut conversation = Conversation::new();
            conversation.push_user(text);
            let assistant = Assistant::from_config(&config)?;
            let reply = assistant.reply(&conversation, &cancel_on_ctrl_c()).await?;
            println!("{}", reply);
            Ok(())
        }
        Commands::Tools => {
            let registry = ToolFactory::create_default_registry(&config.tools)?;
            println!("{}", serde_json::to_string_pretty(&registry.list_tools())?);
            Ok(())
        }
    }
}

async fn run_reply(config: &ParleyConfig, path: &Path, save: bool) -> Result<()> {
    let mut conversation = read_conversation(path).await?;
    let assistant = Assistant::from_config(config)?;

    let reply = assistant.reply(&conversation, &cancel_on_ctrl_c()).await?;
    println!("{}", reply);

    if save {
        conversation.push_assistant(reply);
        let json = serde_json::to_string_pretty(&conversation)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Saved reply to {}", path.display());
    }
    Ok(())
}

async fn run_title(config: &ParleyConfig, path: &Path) -> Result<()> {
    let conversation = read_conversation(path).await?;
    let assistant = Assistant::from_config(config)?;

    let title = assistant.title(&conversation, &cancel_on_ctrl_c()).await?;
    println!("{}", title);
    Ok(())
}

async fn read_conversation(path: &Path) -> Result<Conversation> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read conversation file {}", path.display()))?;
    let conversation: Conversation = serde_json::from_str(&content)
        .with_context(|| format!("invalid conversation JSON in {}", path.display()))?;
    log::debug!(
        "Loaded conversation {} with {} messages",
        conversation.id,
        conversation.messages.len()
    );
    Ok(conversation)
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling the current turn");
            trigger.cancel();
        }
    });
    token
}
