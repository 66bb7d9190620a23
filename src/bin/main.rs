use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;
use vortex_axum::{
    AccessPolicy, AuthenticatedUser, VortexConfig, VortexRoute, VortexSettings, VortexState,
    api_path, configure_vortex, resolve_settings_path, vortex_router,
};

#[derive(Parser)]
#[command(name = "vortex-axum")]
#[command(about = "Vortex invitation API routes for axum")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Vortex routes as a standalone HTTP server
    Serve {
        /// Bind address, e.g. 0.0.0.0:3000
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: String,
        /// Path the routes are mounted under
        #[arg(long, default_value = "/api/vortex")]
        prefix: String,
        /// JSON settings file ({"apiKey", "apiBaseUrl"})
        #[arg(long, env = "VORTEX_CONFIG")]
        config: Option<PathBuf>,
        /// Trust this request header as the user id (development only)
        #[arg(long)]
        user_header: Option<String>,
        /// Register access hooks that allow every operation (development only)
        #[arg(long, default_value_t = false)]
        allow_all: bool,
    },
    /// Print the route table
    Routes {
        #[arg(long, default_value = "/api/vortex")]
        base_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("vortex_axum=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            prefix,
            config,
            user_header,
            allow_all,
        } => {
            let config = build_config(config.or_else(resolve_settings_path), user_header, allow_all)?;
            configure_vortex(config)?;

            let state = VortexState::global()?;
            let app = Router::new().nest(&prefix, vortex_router(state));

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("Vortex routes listening on http://{}{}", bind, prefix);

            axum::serve(listener, app).await?;
        }
        Commands::Routes { base_url } => {
            for route in VortexRoute::ALL {
                println!(
                    "{:<14} {}",
                    route.methods().join(","),
                    api_path(&base_url, route)
                );
            }
        }
    }

    Ok(())
}

/// Build the configuration from the settings file and CLI flags.
fn build_config(
    settings_path: Option<PathBuf>,
    user_header: Option<String>,
    allow_all: bool,
) -> Result<VortexConfig> {
    let mut config = match settings_path {
        Some(path) => {
            info!("Loading Vortex settings from {}", path.display());
            VortexSettings::from_file(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
                .into_config()
        }
        None => VortexConfig::default(),
    };

    if let Some(header) = user_header {
        warn!("Trusting the {} header as user identity", header);
        config = config.authenticate_user(move |req| {
            let user = req.header(&header).map(AuthenticatedUser::new);
            async move { Ok(user) }
        });
    }

    if allow_all {
        warn!("All access hooks allow every operation");
        config = config.access_policy(AccessPolicy::allow_all());
    }

    Ok(config)
}
