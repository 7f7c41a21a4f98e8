//! Users console entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use users_console::config::Config;
use users_console::controller::{FetchOutcome, SubmitOutcome, SyncController, SyncSettings};
use users_console::metrics;
use users_console::render::{escape_terminal, ConsoleSurface, HtmlSurface, Surface};
use users_console::users::{FormInput, HttpUsersApi, UsersApi};
use users_console::utils::shutdown_signal;
use users_console::view::HealthState;
use users_console::ConsoleError;

/// Client for the user-management REST API.
#[derive(Parser, Debug)]
#[command(name = "users-console")]
#[command(about = "Watch, list and create users on a user-management API")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the API base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep the user list and health status in sync (default).
    Watch,

    /// Fetch and print the user list once.
    List {
        /// Print the list as HTML markup.
        #[arg(long)]
        html: bool,
    },

    /// Create a user.
    Add {
        /// User name.
        #[arg(long)]
        name: String,

        /// User email.
        #[arg(long)]
        email: String,
    },

    /// Show a single user.
    Show {
        /// User id.
        id: i64,
    },

    /// Run one health check.
    Health,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load()?;
    if let Some(base_url) = args.base_url {
        config.api_base_url = base_url;
    }

    init_logging(&config, args.verbose || config.verbose);

    // Initialize metrics; descriptions need the recorder installed first
    if config.metrics_enabled {
        metrics::install_exporter(config.metrics_port)?;
    }
    metrics::init_metrics();

    // Handle subcommands
    match args.command {
        Some(Command::Watch) | None => cmd_watch(config).await,
        Some(Command::List { html }) => cmd_list(config, html).await,
        Some(Command::Add { name, email }) => cmd_add(config, name, email).await,
        Some(Command::Show { id }) => cmd_show(config, id).await,
        Some(Command::Health) => cmd_health(config).await,
        Some(Command::CheckConfig) => cmd_check_config(config),
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays readable.
fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("users_console=debug,info")
    } else {
        EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

/// Validate config and build a controller around `surface`.
fn build_controller<S: Surface + 'static>(
    config: &Config,
    surface: S,
) -> users_console::Result<SyncController<HttpUsersApi, S>> {
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        ConsoleError::InvalidConfig(e)
    })?;

    let api = HttpUsersApi::new(config)?;
    Ok(SyncController::new(api, surface, SyncSettings::from(config)))
}

/// Poll users and health until shutdown.
async fn cmd_watch(config: Config) -> anyhow::Result<()> {
    let controller = Arc::new(build_controller(
        &config,
        ConsoleSurface::new(std::io::stdout()),
    )?);

    info!("Watching {}", config.api_base_url);
    let handles = controller.initialize();

    shutdown_signal().await;
    handles.cancel();

    info!("Stopped");
    Ok(())
}

/// Fetch the list once.
async fn cmd_list(config: Config, html: bool) -> anyhow::Result<()> {
    if html {
        let controller = build_controller(&config, HtmlSurface::new())?;
        let outcome = controller.fetch_users().await;
        println!("{}", controller.surface().lock().await.users_list());
        return fetch_result(outcome);
    }

    let controller = build_controller(&config, ConsoleSurface::new(std::io::stdout()))?;
    fetch_result(controller.fetch_users().await)
}

fn fetch_result(outcome: FetchOutcome) -> anyhow::Result<()> {
    match outcome {
        FetchOutcome::Failed(e) => Err(e.into()),
        FetchOutcome::Applied(_) | FetchOutcome::Stale | FetchOutcome::Skipped => Ok(()),
    }
}

/// Submit one user through the form.
async fn cmd_add(config: Config, name: String, email: String) -> anyhow::Result<()> {
    let controller = build_controller(&config, ConsoleSurface::new(std::io::stdout()))?;
    controller.fill_form(FormInput::new(name, email)).await;

    match controller.submit_user().await {
        SubmitOutcome::Created(user) => {
            info!(id = user.id, "Created");
            Ok(())
        }
        SubmitOutcome::Rejected(message) => Err(anyhow::anyhow!(message)),
    }
}

/// Print a single user.
async fn cmd_show(config: Config, id: i64) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    let api = HttpUsersApi::new(&config)?;

    let user = api.get_user(id).await?;
    println!(
        "#{}  {} <{}>",
        user.id,
        escape_terminal(&user.name),
        escape_terminal(&user.email)
    );

    Ok(())
}

/// Run one health check.
async fn cmd_health(config: Config) -> anyhow::Result<()> {
    let controller = build_controller(&config, ConsoleSurface::new(std::io::stdout()))?;

    match controller.check_health().await {
        HealthState::Unhealthy => Err(anyhow::anyhow!("server is unhealthy")),
        HealthState::Healthy | HealthState::Checking => Ok(()),
    }
}

/// Check configuration validity.
fn cmd_check_config(config: Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("USERS CONSOLE - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  API Base URL: {}", config.api_base_url);
    println!("  HTTP Timeout: {}ms", config.http_timeout_ms);
    println!("  Users Poll Interval: {}ms", config.users_poll_interval_ms);
    println!("  Health Poll Interval: {}ms", config.health_poll_interval_ms);
    println!("  Notice TTL: {}ms", config.notice_ttl_ms);
    println!(
        "  Metrics: {}",
        if config.metrics_enabled {
            format!("Enabled (port {})", config.metrics_port)
        } else {
            "Disabled".to_string()
        }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
