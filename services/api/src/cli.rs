use crate::demo::{run_autotune, run_demo, AutotuneArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dispatch_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Dispatch Matching Service",
    about = "Run the shift-to-worker matching service or exercise it from the command line",
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
    /// Run a seeded end-to-end matching demo: predict, auto-assign, autofill
    Demo(DemoArgs),
    /// Run one weight-recalibration pass over synthetic feedback
    Autotune(AutotuneArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Autotune(args) => run_autotune(args),
    }
}
