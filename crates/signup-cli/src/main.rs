mod activities_cmd;
mod config;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use signup_core::{SignupService, load_catalog, seed_registry};

use config::SignupConfig;

#[derive(Parser)]
#[command(name = "signup", about = "Extracurricular activity signup service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a signup config file
    Init {
        /// Address the server binds to
        #[arg(long, default_value = config::DEFAULT_BIND)]
        bind: String,
        /// Port the server listens on
        #[arg(long, default_value_t = config::DEFAULT_PORT)]
        port: u16,
        /// Catalog file to load instead of the built-in activities
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Start the HTTP server
    Serve {
        /// Address to bind (overrides SIGNUP_BIND env var)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides SIGNUP_PORT env var)
        #[arg(long)]
        port: Option<u16>,
        /// Catalog TOML file (overrides SIGNUP_CATALOG env var)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List the activities the server would start with
    Activities {
        /// Catalog TOML file (overrides SIGNUP_CATALOG env var)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print JSON in the same shape as GET /activities
        #[arg(long)]
        json: bool,
    },
}

/// Execute the `signup init` command: write config file.
fn cmd_init(bind: &str, port: u16, catalog: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        server: config::ServerSection {
            bind: bind.to_string(),
            port,
        },
        catalog: catalog.map(|path| config::CatalogSection { path }),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  server.bind = {bind}");
    println!("  server.port = {port}");
    if let Some(ref catalog) = cfg.catalog {
        println!("  catalog.path = {}", catalog.path.display());
    }
    println!();
    println!("Next: run `signup serve` to start the server.");

    Ok(())
}

/// Build the service from a catalog file, or the seed catalog when `None`.
fn build_service(catalog: Option<&Path>) -> anyhow::Result<SignupService> {
    let registry = match catalog {
        Some(path) => load_catalog(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => seed_registry(),
    };
    Ok(SignupService::new(registry))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            bind,
            port,
            catalog,
            force,
        } => {
            cmd_init(&bind, port, catalog, force)?;
        }
        Commands::Serve {
            bind,
            port,
            catalog,
        } => {
            let resolved = SignupConfig::resolve(bind.as_deref(), port, catalog)?;
            let service = build_service(resolved.catalog.as_deref())?;
            serve_cmd::run_serve(service, &resolved.bind, resolved.port).await?;
        }
        Commands::Activities { catalog, json } => {
            let resolved = SignupConfig::resolve(None, None, catalog)?;
            let service = build_service(resolved.catalog.as_deref())?;
            activities_cmd::run_activities(&service.list(), json)?;
        }
    }

    Ok(())
}
