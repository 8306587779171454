use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use gameprice::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for gameprice::AppCommand {
    fn from(cmd: Commands) -> gameprice::AppCommand {
        match cmd {
            Commands::Price { currency, item_ids } => {
                gameprice::AppCommand::Price { currency, item_ids }
            }
            Commands::Show { item_id } => gameprice::AppCommand::Show { item_id },
            Commands::Clear { item_id } => gameprice::AppCommand::Clear { item_id },
            Commands::Reset => gameprice::AppCommand::Reset,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Price items in a currency (USD, EUR, GBP, RUB, BTC)
    Price {
        currency: String,
        #[arg(required = true)]
        item_ids: Vec<String>,
    },
    /// Display the stored prices of an item
    Show { item_id: String },
    /// Reset the stored prices of an item to zero
    Clear { item_id: String },
    /// Recreate all price records from the catalog
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => gameprice::cli::setup::setup(),
        Some(cmd) => gameprice::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
