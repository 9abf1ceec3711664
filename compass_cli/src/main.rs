use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{distance::DistanceArgs, replay::ReplayArgs};

mod distance;
mod parsers;
mod replay;
mod script;
mod table;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted session against a headless map and print the final state
    #[command(visible_alias = "r")]
    Replay {
        #[command(flatten)]
        args: ReplayArgs,
    },
    /// Straight-line and travel distance between two points
    #[command(visible_alias = "d")]
    Distance {
        #[command(flatten)]
        args: DistanceArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Commands::Replay { args }) => replay::run(args).await?,
        Some(Commands::Distance { args }) => distance::run(args).await?,
        None => {
            // Handle no command provided
        }
    }

    Ok(())
}
