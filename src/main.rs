#[macro_use]
extern crate log;

use std::path::PathBuf;

use clap::Parser;
use smartgdz_core::{app, config};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file. When omitted, the config is read from
    /// the environment.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logger() {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn load_config(args: &Args) -> Result<config::Config, anyhow::Error> {
    match &args.config {
        Some(path) => config::Config::from_file(path),
        None => {
            if let Err(err) = dotenvy::dotenv() {
                if !err.not_found() {
                    warn!("Failed to load .env file: {}", err);
                }
            }
            config::Config::from_env()
        }
    }
}

#[tokio::main]
async fn main() {
    init_logger();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!("Failed to load config: {}", err);
            std::process::exit(1);
        }
    };

    info!("Bot is starting...");
    if let Err(err) = app::run(config::SharedConfig::new(config)).await {
        error!("{}", err);
        std::process::exit(1);
    }
}
