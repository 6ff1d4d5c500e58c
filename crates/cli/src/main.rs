//! `folio` command-line entrypoint.

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_kernel::settings::Settings;
use sqlx::postgres::PgPoolOptions;

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Book catalog service")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Override the configured listen port
        #[arg(long, env = "FOLIO_SERVER__PORT")]
        port: Option<u16>,
    },
    /// Create any missing tables and exit
    Provision,
    /// Print the merged OpenAPI document
    Openapi,
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load folio settings")?;
    if cli.debug {
        settings.telemetry.log_level = "debug".to_string();
    }
    folio_telemetry::init(&settings.telemetry).context("failed to initialize tracing")?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            folio_app::run(settings).await
        }
        Command::Provision => {
            let pool = folio_db::create_pool(&settings.database).await?;
            let registry = folio_app::build_registry(&pool, &settings);
            folio_app::provision(&pool, &registry).await?;
            pool.close().await;
            Ok(())
        }
        Command::Openapi => {
            // Nothing is queried; the pool only has to exist to build modules.
            let pool = PgPoolOptions::new().connect_lazy_with(settings.database.connect_options()?);
            let registry = folio_app::build_registry(&pool, &settings);
            let doc = folio_http::router::openapi_document(&registry, &settings.server.api_prefix);
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
        Command::Config => {
            println!("{}", render_config(&settings));
            Ok(())
        }
    }
}

fn render_config(settings: &Settings) -> String {
    let mut out = String::new();
    out.push_str(&format!("environment     = {}\n", settings.environment.as_str()));
    out.push_str(&format!("listen          = {}\n", settings.server.bind_address()));
    out.push_str(&format!("api_prefix      = {}\n", settings.server.api_prefix));
    out.push_str(&format!("database        = {}\n", settings.database.redacted_url()));
    out.push_str(&format!("max_connections = {}\n", settings.database.max_connections));
    out.push_str(&format!("query_timeout   = {}ms\n", settings.database.query_timeout_ms));
    out.push_str(&format!("log_format      = {:?}", settings.telemetry.log_format));
    out
}
