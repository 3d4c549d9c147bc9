use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use boerse::notify::SmtpSender;
use boerse::web::WebServer;
use boerse::{AppContext, Config, Database, Janitor};

/// Research project exchange web server.
#[derive(Parser)]
#[command(name = "boerse", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "./boerse.toml")]
    config: PathBuf,
    /// Apply database migrations and exit.
    #[arg(long)]
    init_db: bool,
    /// Print a new random cookie secret and exit.
    #[arg(long)]
    gen_cookie_secret: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.gen_cookie_secret {
        println!("{}", boerse::token::generate_cookie_secret());
        return;
    }

    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    if let Err(e) = boerse::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        boerse::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(cli, config).await {
        error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> boerse::Result<()> {
    let db = Database::open(&config.database.path).await?;
    info!("Database ready at {}", config.database.path);

    if cli.init_db {
        info!("Database initialized (schema version {})", db.schema_version().await?);
        db.close().await;
        return Ok(());
    }

    config.validate()?;

    let sender = Arc::new(SmtpSender::from_config(&config.mail)?);
    let grace = Duration::from_secs(config.server.shutdown_grace_secs);
    let janitor_enabled = config.janitor.enabled;
    let ctx = Arc::new(AppContext::new(config, db.clone(), sender)?);

    let shutdown = CancellationToken::new();

    let janitor = if janitor_enabled {
        Some(Janitor::new(ctx.clone()).spawn(shutdown.child_token()))
    } else {
        info!("Janitor disabled");
        None
    };

    let server = WebServer::new(ctx)?;
    let (_addr, mut server_task) = server.spawn(shutdown.clone()).await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown requested");
        }
        _ = &mut server_task => {
            warn!("Web server exited unexpectedly");
        }
    }

    shutdown.cancel();

    if let Some(janitor) = janitor {
        if let Err(e) = janitor.await {
            error!("Janitor task failed: {}", e);
        }
    }

    if !server_task.is_finished() {
        match tokio::time::timeout(grace, &mut server_task).await {
            Ok(_) => {}
            Err(_) => {
                warn!(
                    "In-flight requests did not finish within {} seconds; aborting",
                    grace.as_secs()
                );
                server_task.abort();
            }
        }
    }

    db.close().await;
    info!("Shutdown complete");
    Ok(())
}
