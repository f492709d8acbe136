use clap::{Parser, Subcommand};
use scope::{Config, ConeUnit, IdType, ScopeClient, Table};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scope", about = "Query the SCoPe feature and classification catalogs")]
struct Cli {
    /// Config file layered over the built-in defaults
    /// (default: ~/.config/scope/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level instead of info.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cone search around one position.
    Cone {
        #[arg(long, allow_hyphen_values = true)]
        ra: f64,
        #[arg(long, allow_hyphen_values = true)]
        dec: f64,
        #[arg(long, default_value_t = scope_core::types::DEFAULT_CONE_RADIUS)]
        radius: f64,
        /// deg, arcmin or arcsec.
        #[arg(long, default_value = "arcsec")]
        unit: String,
    },
    /// Look sources up by survey or cross-match id.
    Ids {
        /// Numeric ids are sent as integers, anything else as strings.
        #[arg(required = true)]
        ids: Vec<String>,
        /// _id, AllWISE___id, Gaia_EDR3___id or PS1_DR1___id.
        #[arg(long, default_value = "_id")]
        id_type: String,
    },
    /// Print index metadata for both catalogs.
    Indices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => or_defaults(Config::load()),
    };
    let tokens = tokens_from_env(&config.service.hosts);
    let client = ScopeClient::from_config(config, &tokens)?;

    match cli.command {
        Command::Cone {
            ra,
            dec,
            radius,
            unit,
        } => {
            let unit: ConeUnit = unit.parse()?;
            print_table(client.cone_search(ra, dec, radius, unit).await?);
        }
        Command::Ids { ids, id_type } => {
            let id_type: IdType = id_type.parse()?;
            let ids: Vec<serde_json::Value> = ids.iter().map(|id| parse_id(id)).collect();
            print_table(client.ids_search(ids, id_type).await?);
        }
        Command::Indices => {
            let (classifications, features) = client.get_indices().await;
            println!(
                "{}",
                serde_json::json!({ "classifications": classifications, "features": features })
            );
        }
    }
    Ok(())
}

/// `SCOPE_TOKEN_<HOST>` for every configured host, upper-cased.
fn tokens_from_env(hosts: &[String]) -> HashMap<String, String> {
    hosts
        .iter()
        .filter_map(|host| {
            let var = format!("SCOPE_TOKEN_{}", host.to_uppercase().replace(['-', '.'], "_"));
            std::env::var(var).ok().map(|token| (host.clone(), token))
        })
        .collect()
}

/// The loaded user config, or the built-in defaults with a warning.
fn or_defaults(loaded: anyhow::Result<Config>) -> Config {
    loaded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load user config, using built-in defaults");
        Config::defaults()
    })
}

fn parse_id(raw: &str) -> serde_json::Value {
    match raw.parse::<i64>() {
        Ok(n) => n.into(),
        Err(_) => raw.into(),
    }
}

fn print_table(table: Option<Table>) {
    match table {
        Some(table) => {
            let n = table.len();
            for row in table.into_rows() {
                println!("{}", serde_json::Value::Object(row));
            }
            tracing::info!(rows = n, "done");
        }
        None => println!("no result"),
    }
}
