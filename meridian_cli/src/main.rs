use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tracing::info;

use crate::{
    generate::GenerateSubcommands,
    query::{QueryArgs, QueryKind},
};

mod generate;
mod query;
mod settings;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON routing configuration, the built-in profiles are used when omitted
    #[arg(short, long, global = true, env = "MERIDIAN_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(visible_alias = "g")]
    Generate {
        #[command(subcommand)]
        commands: GenerateSubcommands,
    },
    /// Prepares the missing or stale hierarchies and landmarks of a graph directory
    Prepare {
        #[arg(short, long)]
        graph: PathBuf,
    },
    Route {
        #[command(flatten)]
        args: QueryArgs,
    },
    Matrix {
        #[command(flatten)]
        args: QueryArgs,
    },
    Isochrone {
        #[command(flatten)]
        args: QueryArgs,
    },
    Match {
        #[command(flatten)]
        args: QueryArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = settings::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Generate { commands }) => generate::run(commands, &config)?,
        Some(Commands::Prepare { graph }) => {
            let generation = settings::load_generation(&graph, &config)?;
            info!(
                hierarchies = ?generation.ch_profiles(),
                landmarks = ?generation.lm_profiles(),
                "preparations ready"
            );
        }
        Some(Commands::Route { args }) => query::run(QueryKind::Route, args, config)?,
        Some(Commands::Matrix { args }) => query::run(QueryKind::Matrix, args, config)?,
        Some(Commands::Isochrone { args }) => query::run(QueryKind::Isochrone, args, config)?,
        Some(Commands::Match { args }) => query::run(QueryKind::Match, args, config)?,
        None => {}
    }

    Ok(())
}
