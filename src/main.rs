use anyhow::{Context, Result, anyhow, bail};
use tracing::info;

mod card_finder;
mod error;
mod fetcher;
mod models;
mod params;
mod scrapers;
mod traits;

use card_finder::CardFinder;
use models::SearchRequest;
use traits::CatalogConfig;

const USAGE: &str = "\
Usage:
  card-finder search [--name NAME] [--rarity CODE] [--foil CODE]
  card-finder search --json '{\"cardName\": \"...\", \"rarity\": \"...\", \"foil\": \"...\"}'
  card-finder sets

Results are printed to stdout as JSON. Settings are read from CATALOG_* environment
variables or a .env file.";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Search(SearchRequest),
    Sets,
    Help,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let command = match args.next().as_deref() {
        Some("search") => {
            let mut request = SearchRequest::default();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--name" | "-n" => {
                        request.card_name = Some(args.next().context("Missing value for --name")?);
                    }
                    "--rarity" | "-r" => {
                        request.rarity = Some(args.next().context("Missing value for --rarity")?);
                    }
                    "--foil" | "-f" => {
                        request.foil = Some(args.next().context("Missing value for --foil")?);
                    }
                    "--json" => {
                        let body = args.next().context("Missing value for --json")?;
                        request = serde_json::from_str(&body).context("Invalid search JSON")?;
                    }
                    "-h" | "--help" => return Ok(Command::Help),
                    other => bail!("Unknown argument: {other}"),
                }
            }
            Command::Search(request)
        }
        Some("sets") => match args.next() {
            None => Command::Sets,
            Some(other) => bail!("Unknown argument: {other}"),
        },
        Some("-h" | "--help") | None => Command::Help,
        Some(other) => return Err(anyhow!("Unknown command: {other}")),
    };

    Ok(command)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let command = parse_args(std::env::args().skip(1))?;
    if command == Command::Help {
        eprintln!("{USAGE}");
        return Ok(());
    }

    let config = CatalogConfig::from_env();
    info!("Using catalog at {}", config.base_url);
    let finder = CardFinder::new(config)?;

    let output = if let Command::Search(request) = command {
        serde_json::to_string_pretty(&finder.search(&request).await?)?
    } else {
        serde_json::to_string_pretty(&finder.list_sets().await?)?
    };
    println!("{output}");

    Ok(())
}
