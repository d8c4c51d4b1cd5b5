use catalog_db::facade::{Database, connect_database};
use catalog_db::postgres::DatabaseSettings;
use catalog_db::translation::{StatementKind, translate_statement};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catalog-db", version, about = "Catalog database shim: bootstrap, translate, check")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect and create the catalog schema
    Bootstrap,
    /// Print the Postgres form of a SQLite-style statement (no database needed)
    Translate {
        sql: String,
        /// Column for the automatic `RETURNING` clause
        #[arg(long, default_value = "id")]
        returning_column: String,
        /// Leave inserts without a `RETURNING` clause
        #[arg(long)]
        no_returning: bool,
    },
    /// Connect and run `SELECT 1`
    Check,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    // a missing .env file is fine
    let _ = dotenvy::dotenv();
    init_logging(cli.json);

    match cli.command {
        Command::Translate {
            sql,
            returning_column,
            no_returning,
        } => {
            let kind = StatementKind::classify(&sql);
            let column = (!no_returning).then_some(returning_column.as_str());
            let translated = translate_statement(&sql, kind, column, true);
            let out = serde_json::json!({
                "kind": translated.kind,
                "sql": translated.text,
                "returning": translated.returning,
            });
            println!("{out}");
        }
        Command::Bootstrap => {
            let settings = DatabaseSettings::from_env().unwrap_or_else(|e| {
                tracing::error!(error = %e, "invalid database settings");
                std::process::exit(1);
            });
            let db = Database::connect(&settings).unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to set up database pool");
                std::process::exit(1);
            });
            if let Err(e) = db.bootstrap().await {
                tracing::error!(error = %e, "bootstrap failed");
                std::process::exit(1);
            }
        }
        Command::Check => {
            let db = connect_database().await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to connect");
                std::process::exit(1);
            });
            match db.get("SELECT 1 AS ok", &[]).await {
                Ok(Some(_)) => tracing::info!("database reachable"),
                Ok(None) => {
                    tracing::error!("SELECT 1 returned no rows");
                    std::process::exit(1);
                }
                Err(e) => {
                    tracing::error!(error = %e, "check query failed");
                    std::process::exit(1);
                }
            }
        }
    }
}
