use crate::lookup::{run_panel, PanelArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use property_panel::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Property Panel",
    about = "Serve or query the consolidated property panel from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Build one property panel with the configured providers and print it as JSON
    Panel(PanelArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Panel(args) => run_panel(args).await,
    }
}
