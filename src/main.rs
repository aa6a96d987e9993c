use clap::{Parser, Subcommand};
use m402_demo::{config::Config, headless, tui, utils};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "m402-demo", about = "m402 payment demo on Tempo testnet", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal widget (default)
    Tui,
    /// Connect, fund if needed and pay once, then print the explorer link
    Run,
    /// Print the connected account, chain and balance
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            // stdout belongs to the terminal UI
            let _guard = utils::init_file_logger(&config.logging.log_dir)?;
            info!("Configuration loaded: {:?}", config.chain);
            tui::run(config).await
        }
        Command::Run => {
            utils::init_stderr_logger()?;
            info!("Configuration loaded: {:?}", config.chain);
            headless::run(config).await
        }
        Command::Status => {
            utils::init_stderr_logger()?;
            headless::status(config).await
        }
    }
}
